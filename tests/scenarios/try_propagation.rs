use predicates::prelude::*;

use crate::test_utils::caps_cmd_with_source;

// `try_receive` on a channel nobody has written to always yields
// `Result::Err("empty")` (§4.10); the postfix `?` on that value must then
// redirect the process straight to `__Error` with `__last_error` set.
const SOURCE: &str = r#"
module demo;

group G {
    channel<int; 1> c;

    process P() {
        state Start, Done, __Error;

        on Start {
            try_receive c -> rr;
            let x = rr?;
            -> Done;
        }

        on Done {
            -> Done;
        }

        on __Error {
            -> __Error;
        }
    }

    schedule {
        step P;
    }
}
"#;

#[test]
fn a_failed_try_receive_propagates_through_try_into_the_error_state() {
    let (_dir, mut cmd) = caps_cmd_with_source(SOURCE);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Completed (all_processes_finished)"))
        .stdout(predicate::str::contains("P -> __Error"));
}
