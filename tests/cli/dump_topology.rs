use predicates::prelude::*;

use crate::test_utils::caps_cmd_with_source;

const SOURCE: &str = r#"
module demo;

@pipeline_safe
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
fn dump_topology_text_prints_the_writer_to_reader_edge() {
    let (_dir, mut cmd) = caps_cmd_with_source(SOURCE);
    cmd.args(["--check-only", "--dump-topology", "text"])
        .assert()
        .success()
        .stdout(predicate::str::contains("P -> Q"));
}
