use crate::gb::Bus;
use crate::gb::cpu::CPU;

/// Clock cycles spent to dispatch an interrupt: two wait states,
/// pushing PC onto the stack and loading the vector.
pub const INTERRUPT_DISPATCH_CYCLES: u16 = 20;

/// Services the highest priority pending interrupt if IME allows it.
/// Returns the clock cycles spent, which is zero if nothing has been serviced.
/// The HALT bug is not emulated, PC always advances past HALT.
pub fn handle<T: Bus>(cpu: &mut CPU<'_>, bus: &mut T) -> u16 {
    let irq = bus.interrupts();
    if !irq.is_master_enabled() {
        return 0;
    }
    let Some(pending) = irq.pending_interrupt() else {
        return 0;
    };
    let Some(address) = pending.vector() else {
        return 0;
    };

    let irq = bus.interrupts_mut();
    irq.acknowledge(pending);
    irq.set_master_enable(false);

    log::trace!("servicing {pending:?} at {address:#06x}, return to {:#06x}", cpu.r.pc);
    // Save current execution address by pushing it onto the stack
    cpu.push(cpu.r.pc, bus);
    cpu.r.pc = address;
    INTERRUPT_DISPATCH_CYCLES
}
