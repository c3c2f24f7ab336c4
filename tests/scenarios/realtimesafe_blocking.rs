use predicates::prelude::*;

use crate::test_utils::caps_cmd_with_source;

const SOURCE: &str = r#"
module demo;

@realtimesafe
group Hard {
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

    schedule {
        step P;
    }
}
"#;

#[test]
fn a_realtimesafe_group_rejects_a_blocking_send() {
    let (_dir, mut cmd) = caps_cmd_with_source(SOURCE);
    cmd.arg("--check-only")
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains(
            "blocking 'send' on 'c' inside an @realtimesafe group",
        ));
}
