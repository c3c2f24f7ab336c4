use predicates::prelude::*;

use crate::test_utils::caps_cmd_with_source;

const SOURCE: &str = r#"
module demo;

group Pipeline {
    channel<int; 2> c;

    process P() {
        state S0, S_done;

        on S0 {
            send 1 -> c;
            -> S_done;
        }

        on S_done {
            -> S_done;
        }
    }

    process Q() {
        state S0, S_done;

        on S0 {
            receive c -> var x;
            -> S_done;
        }

        on S_done {
            -> S_done;
        }
    }

    schedule {
        step P;
        step Q;
    }
}
"#;

#[test]
fn a_buffered_handoff_completes_in_one_tick() {
    let (_dir, mut cmd) = caps_cmd_with_source(SOURCE);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Completed (all_processes_finished)"));
}
