//! Fuzz target: state command codec and register transitions
//!
//! Every byte either decodes to a state whose command is that byte, or to
//! nothing.  A sequence of table lookups driven by the input must keep the
//! register on a known state and never write a byte the codec rejects.
//!
//! cargo fuzz run fuzz_state_codec

#![no_main]

use libfuzzer_sys::fuzz_target;
use unbrake::fsm::register::StateRegister;
use unbrake::fsm::{State, Table};

fuzz_target!(|data: &[u8]| {
    let Some((&first, ops)) = data.split_first() else {
        return;
    };

    if let Some(state) = State::from_wire(first) {
        assert_eq!(state.wire_command(), first);
    }

    let start = State::ALL[first as usize % State::ALL.len()];
    let register = StateRegister::new(start);
    for op in ops {
        let table = match op % 3 {
            0 => Table::Next,
            1 => Table::WaterOn,
            _ => Table::WaterOff,
        };
        let _ = register.apply(table, |byte| {
            assert!(State::from_wire(byte).is_some());
            Ok(())
        });
    }
    assert!(State::ALL.contains(&register.read()));
});
