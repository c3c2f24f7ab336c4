use predicates::prelude::*;

use crate::test_utils::caps_cmd_with_source;

const SOURCE: &str = r#"
module demo;

group Pipeline {
    channel<int; 1> c;

    process P() {
        state S0, Done;

        on S0 {
            send 1 -> c;
            -> Done;
        }

        on Done {
            -> Done;
        }
    }

    process Q() {
        state S0, Done;

        on S0 {
            receive c -> var x;
            -> Done;
        }

        on Done {
            -> Done;
        }
    }

    schedule {
        step P;
        step Q;
    }
}
"#;

#[test]
fn check_only_exits_clean_without_running_a_group() {
    let (_dir, mut cmd) = caps_cmd_with_source(SOURCE);
    cmd.arg("--check-only")
        .assert()
        .success()
        .stdout(predicate::str::contains("Completed").not());
}
