use insta::assert_snapshot;

use tally_cli::{Output, run_demo, run_script};
use tally_ledger::{ReportStyle, TransferRules};

fn text_output(unit: &str) -> Output {
    Output {
        style: ReportStyle::with_unit(unit),
        json: false,
    }
}

fn render(f: impl FnOnce(&mut Vec<u8>) -> anyhow::Result<()>) -> (String, anyhow::Result<()>) {
    let mut buf = Vec::new();
    let result = f(&mut buf);
    (String::from_utf8(buf).unwrap(), result)
}

#[test]
fn script_run_prints_receipts_and_reports() {
    let script = "fill | R | T | 10\nleak | T | E | 4\n";
    let (text, result) = render(|out| {
        run_script(out, script, TransferRules::permissive(), &text_output("L"))
    });
    result.unwrap();

    assert_snapshot!(text, @r"
    ✓ fill
      R: -10 (now -10 L)
      T: +10 (now 10 L)

    ✓ leak
      T: -4 (now 6 L)
      E: +4 (now 4 L)

    Current Balances:
      E: 4 L
      R: -10 L
      T: 6 L

    === Verification ===
    E: started with 0, gained 4, lost 0 (+4) = 4 L
    E actual: 4 L

    R: started with 0, gained 0, lost 10 (-10) = -10 L
    R actual: -10 L

    T: started with 0, gained 10, lost 4 (+10, -4) = 6 L
    T actual: 6 L

    === Conservation Check ===
    Total in system: 0 L

    === Transaction History ===
    1. fill: 10 L from R to T
    2. leak: 4 L from T to E
    ");
}

#[test]
fn demo_ends_with_expected_balances() {
    let (text, result) = render(|out| {
        run_demo(out, TransferRules::strict(), &text_output("liters"))
    });
    result.unwrap();

    assert!(text.starts_with("=== Water Tank System Demo ===\n"));
    assert!(text.contains("Tank_A: started with 0, gained 120, lost 30 (+100, -30, +20) = 90 liters\n"));
    assert!(text.contains("Environment actual: 5 liters\n"));
    assert!(text.contains("=== Conservation Check ===\nTotal in system: 0 liters\n"));
    assert!(text.ends_with("4. Tank B leaks to ground: 5 liters from Tank_B to Environment\n"));
}

#[test]
fn json_output_is_the_verification_report() {
    let output = Output {
        style: ReportStyle::default(),
        json: true,
    };
    let (text, result) = render(|out| run_demo(out, TransferRules::permissive(), &output));
    result.unwrap();

    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(json["entries"], 4);
    assert_eq!(json["cached_total"], "0");
    assert_eq!(json["audits"].as_array().map(Vec::len), Some(5));
}

#[test]
fn rejected_line_fails_the_run_after_printing_earlier_receipts() {
    let script = "ok | A | B | 1\nloop | A | A | 1\n";
    let (text, result) = render(|out| {
        run_script(out, script, TransferRules::strict(), &text_output("L"))
    });

    let err = result.unwrap_err();
    assert!(format!("{err:#}").contains("line 2"));
    assert!(text.starts_with("✓ ok\n"));
    assert!(!text.contains("=== Verification ==="));
}

#[test]
fn malformed_script_fails_before_recording() {
    let (text, result) = render(|out| {
        run_script(out, "just words\n", TransferRules::permissive(), &text_output("L"))
    });
    assert!(result.is_err());
    assert!(text.is_empty());
}
