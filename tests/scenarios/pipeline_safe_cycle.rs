use predicates::prelude::*;

use crate::test_utils::caps_cmd_with_source;

const SOURCE: &str = r#"
module demo;

@pipeline_safe
group Ring {
    channel<int; 1> c1;
    channel<int; 1> c2;
    channel<int; 1> c3;

    process A() {
        state S0, Done;

        on S0 {
            send 1 -> c1;
            receive c3 -> var y;
            -> Done;
        }

        on Done {
            -> Done;
        }
    }

    process B() {
        state S0, Done;

        on S0 {
            receive c1 -> var x;
            send x -> c2;
            -> Done;
        }

        on Done {
            -> Done;
        }
    }

    process C() {
        state S0, Done;

        on S0 {
            receive c2 -> var x;
            send x -> c3;
            -> Done;
        }

        on Done {
            -> Done;
        }
    }

    schedule {
        step A;
        step B;
        step C;
    }
}
"#;

#[test]
fn a_pipeline_safe_group_rejects_a_channel_cycle() {
    let (_dir, mut cmd) = caps_cmd_with_source(SOURCE);
    cmd.arg("--check-only")
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("channel graph contains a cycle"));
}
