use predicates::prelude::*;

use crate::test_utils::caps_cmd_with_source;

const SOURCE: &str = r#"
module demo;

group G {
    channel<int; 1> c;

    process R() {
        state Wait;

        on Wait {
            receive c -> var x;
            -> Wait;
        }
    }

    schedule {
        step R;
    }
}
"#;

#[test]
fn a_receive_with_no_writer_deadlocks_after_one_tick_of_no_progress() {
    let (_dir, mut cmd) = caps_cmd_with_source(SOURCE);
    cmd.assert()
        .failure()
        .code(2)
        .stdout(predicate::str::contains("Deadlock (all_processes_blocked_no_progress)"))
        .stderr(predicate::str::contains("ended in deadlock"));
}
