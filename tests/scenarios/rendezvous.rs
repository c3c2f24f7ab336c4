use predicates::prelude::*;

use crate::test_utils::caps_cmd_with_source;

// The rendezvous mailbox is filled only by a `send` scanning for an
// already-blocked receiver (§4.10); the receiver must therefore be
// scheduled to step, and block, before the sender in the same tick.
const SOURCE: &str = r#"
module demo;

group Rendezvous {
    channel<int; 0> c;

    process Receiver() {
        state Wait, Done;

        on Wait {
            receive c -> var x;
            -> Done;
        }

        on Done {
            -> Done;
        }
    }

    process Sender() {
        state Start, Done;

        on Start {
            send 7 -> c;
            -> Done;
        }

        on Done {
            -> Done;
        }
    }

    schedule {
        step Receiver;
        step Sender;
    }
}
"#;

#[test]
fn a_rendezvous_hand_off_completes_once_the_receiver_is_waiting() {
    let (_dir, mut cmd) = caps_cmd_with_source(SOURCE);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Completed (all_processes_finished)"));
}
