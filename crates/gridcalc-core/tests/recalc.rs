//! Edit transactions through the public sheet API.

use gridcalc_core::{
    CellRef, EditError, ErrorKind, GridError, Phase, Sheet, SheetConfig, SheetEvent, Value,
};

fn sheet() -> Sheet<Vec<SheetEvent>> {
    Sheet::with_observer(SheetConfig::default(), Vec::new()).unwrap()
}

fn cell(label: &str) -> CellRef {
    CellRef::from_str(label).unwrap()
}

fn display(label: &str, text: &str) -> SheetEvent {
    SheetEvent::Display {
        label: cell(label),
        text: text.to_string(),
    }
}

/// Apply an edit that must be rejected and check nothing changed.
fn reject(sheet: &mut Sheet<Vec<SheetEvent>>, label: &str, text: &str) -> ErrorKind {
    let before = sheet.snapshot();
    sheet.observer_mut().clear();

    assert!(!sheet.apply_edit(label, text), "{label} = {text} was accepted");
    assert_eq!(sheet.snapshot(), before, "{label} = {text} left changes behind");
    assert_eq!(sheet.last_phase(), Phase::RolledBack);

    match sheet.observer().as_slice() {
        [SheetEvent::Error { kind, .. }] => *kind,
        other => panic!("expected a single error event, got {other:?}"),
    }
}

#[test]
fn commit_updates_cell_and_symbol_table() {
    let mut sheet = sheet();
    assert!(sheet.apply_edit("a0", "2 + 3"));

    assert_eq!(sheet.text("a0"), Some("2 + 3"));
    assert_eq!(sheet.value("a0"), Some(&Value::Number(5.0)));
    assert_eq!(sheet.symbols().get("a0"), Ok(&Value::Number(5.0)));
    assert_eq!(sheet.observer().as_slice(), &[display("a0", "5")]);
    assert!(sheet.inconsistent_cells().is_empty());
}

#[test]
fn propagation_runs_in_dependency_order() {
    let mut sheet = sheet();
    assert!(sheet.apply_edit("a0", "5"));
    assert!(sheet.apply_edit("b0", "a0*2"));
    assert!(sheet.apply_edit("c0", "b0+1"));
    assert_eq!(sheet.display("c0").as_deref(), Some("11"));

    sheet.observer_mut().clear();
    assert!(sheet.apply_edit("a0", "3"));
    assert_eq!(
        sheet.observer().as_slice(),
        &[display("a0", "3"), display("b0", "6"), display("c0", "7")]
    );
    assert!(sheet.inconsistent_cells().is_empty());
}

#[test]
fn diamond_dependents_see_upstream_values() {
    let mut sheet = sheet();
    sheet.apply_edit("a0", "1");
    sheet.apply_edit("b0", "a0 + 1");
    sheet.apply_edit("b1", "a0 * 10");
    sheet.apply_edit("c0", "b0 + b1");
    assert_eq!(sheet.value("c0"), Some(&Value::Number(12.0)));

    assert!(sheet.apply_edit("a0", "2"));
    assert_eq!(sheet.value("c0"), Some(&Value::Number(23.0)));
    assert!(sheet.inconsistent_cells().is_empty());
}

#[test]
fn self_reference_is_rejected() {
    let mut sheet = sheet();
    assert_eq!(reject(&mut sheet, "a0", "a0 + 1"), ErrorKind::CyclicDependency);
}

#[test]
fn direct_cycle_is_rejected() {
    let mut sheet = sheet();
    sheet.apply_edit("a0", "b0 if b0 else 1");
    assert_eq!(reject(&mut sheet, "b0", "a0"), ErrorKind::CyclicDependency);
}

#[test]
fn indirect_cycle_is_rejected() {
    let mut sheet = sheet();
    sheet.apply_edit("c0", "1");
    sheet.apply_edit("b0", "c0 + 1");
    sheet.apply_edit("a0", "b0 + 1");
    assert_eq!(reject(&mut sheet, "c0", "a0 + 1"), ErrorKind::CyclicDependency);
    assert_eq!(sheet.text("c0"), Some("1"));
}

#[test]
fn cycle_message_names_the_path() {
    let mut sheet = sheet();
    sheet.apply_edit("b0", "1");
    sheet.apply_edit("a0", "b0");
    let err = sheet.try_apply_edit("b0", "a0").unwrap_err();
    assert!(matches!(err, EditError::Cycle(_)));
    assert_eq!(err.to_string(), "dependency cycle on b0 detected: b0 -> a0 -> b0");
}

#[test]
fn edit_that_breaks_a_dependent_is_rejected() {
    let mut sheet = sheet();
    sheet.apply_edit("a0", "5");
    sheet.apply_edit("b0", "a0*2");

    assert_eq!(reject(&mut sheet, "a0", "'x'"), ErrorKind::Evaluation);
    assert_eq!(sheet.text("a0"), Some("5"));
    assert_eq!(sheet.value("b0"), Some(&Value::Number(10.0)));
}

#[test]
fn downstream_failure_rolls_back_every_tentative_value() {
    let mut sheet = sheet();
    sheet.apply_edit("a0", "1");
    sheet.apply_edit("b0", "a0 + 1");
    sheet.apply_edit("c0", "1 / (b0 - 3)");

    // b0 becomes 3, then c0 divides by zero.
    let err = sheet.try_apply_edit("a0", "2").unwrap_err();
    assert!(matches!(err, EditError::DependentBroken { dependent, .. } if dependent == cell("c0")));
    assert_eq!(sheet.value("b0"), Some(&Value::Number(2.0)));
    assert_eq!(sheet.symbols().get("b0"), Ok(&Value::Number(2.0)));
    assert!(sheet.inconsistent_cells().is_empty());
}

#[test]
fn compile_errors_are_rejected() {
    let mut sheet = sheet();
    sheet.apply_edit("a0", "4");
    assert_eq!(reject(&mut sheet, "a0", "(1 +"), ErrorKind::Compile);
    assert_eq!(reject(&mut sheet, "a0", "x = 1"), ErrorKind::Compile);
}

#[test]
fn evaluation_errors_are_rejected() {
    let mut sheet = sheet();
    assert_eq!(reject(&mut sheet, "a0", "1 / 0"), ErrorKind::Evaluation);
    assert_eq!(reject(&mut sheet, "a0", "sqrt(-1)"), ErrorKind::Evaluation);
    assert_eq!(reject(&mut sheet, "a0", "nosuchname + 1"), ErrorKind::Evaluation);
}

#[test]
fn rejected_edit_keeps_new_edges_out_of_the_graph() {
    let mut sheet = sheet();
    sheet.apply_edit("a0", "1");
    reject(&mut sheet, "b0", "a0 / 0");
    assert_eq!(sheet.graph().referenced_by(cell("a0")).count(), 0);
    assert!(sheet.dependers("a0").unwrap().is_empty());
}

#[test]
fn empty_cells() {
    let mut sheet = sheet();
    assert_eq!(sheet.value("d3"), Some(&Value::Empty));
    assert_eq!(sheet.display("d3").as_deref(), Some(""));

    // An empty cell is text when concatenated and an error in arithmetic.
    assert!(sheet.apply_edit("a0", "a1 + 'x'"));
    assert_eq!(sheet.display("a0").as_deref(), Some("x"));
    assert_eq!(reject(&mut sheet, "a2", "a1 + 1"), ErrorKind::Evaluation);

    assert!(sheet.apply_edit("a1", "'y'"));
    assert_eq!(sheet.display("a0").as_deref(), Some("yx"));

    // Clearing removes the cell's own edges.
    assert!(sheet.apply_edit("b0", "a1"));
    assert!(sheet.apply_edit("b0", ""));
    assert_eq!(sheet.graph().edges(cell("b0")).count(), 0);
    assert_eq!(sheet.value("b0"), Some(&Value::Empty));
}

#[test]
fn builtin_namespace_is_visible_but_reserved_names_are_not() {
    let mut sheet = sheet();
    assert!(sheet.apply_edit("a0", "sin(pi/2)"));
    assert_eq!(sheet.value("a0"), Some(&Value::Number(1.0)));
    assert_eq!(reject(&mut sheet, "a1", "__name__"), ErrorKind::Evaluation);
}

#[test]
fn names_outside_the_grid_are_not_cells() {
    let mut sheet = sheet();
    assert!(!sheet.is_cell_name("e0"));
    assert!(!sheet.is_cell_name("a4"));
    assert!(sheet.is_cell_name("d3"));
    assert_eq!(reject(&mut sheet, "a0", "e0 + 1"), ErrorKind::Evaluation);
}

#[test]
fn imported_names_cannot_shadow_cells() {
    let mut sheet = sheet();
    let imported = sheet.import_namespace([("rate", Value::Number(0.5)), ("a0", Value::Number(9.0))]);
    assert_eq!(imported, 1);
    assert_eq!(sheet.symbols().get("a0"), Ok(&Value::Empty));

    assert!(sheet.apply_edit("a1", "rate * 4"));
    assert_eq!(sheet.value("a1"), Some(&Value::Number(2.0)));
}

#[test]
fn bound_names_cannot_be_rebound_after_use() {
    let mut sheet = sheet();
    sheet.import_namespace([("rate", Value::Number(0.5))]);
    assert!(sheet.apply_edit("a1", "rate * 4"));
    assert!(sheet.apply_edit("a2", "pi"));

    let before = sheet.snapshot();
    let imported = sheet.import_namespace([
        ("rate", Value::Number(10.0)),
        ("pi", Value::Number(3.0)),
        ("fresh", Value::Number(1.0)),
    ]);
    assert_eq!(imported, 1);
    assert_eq!(sheet.symbols().get("rate"), Ok(&Value::Number(0.5)));
    assert_eq!(sheet.value("a1"), Some(&Value::Number(2.0)));
    assert_eq!(sheet.cells().collect::<Vec<_>>(), before.cells.iter().collect::<Vec<_>>());
    assert!(sheet.inconsistent_cells().is_empty());
    assert!(sheet.apply_edit("a3", "fresh + 1"));
}

#[test]
fn math_namespace_can_be_disabled() {
    let config = SheetConfig {
        import_math: false,
        ..SheetConfig::default()
    };
    let mut sheet = Sheet::new(config).unwrap();
    assert!(sheet.try_apply_edit("a0", "pi").is_err());
    assert!(sheet.try_apply_edit("a0", "1 + 1").is_ok());
}

#[test]
fn unknown_cell_leaves_sheet_untouched() {
    let mut sheet = sheet();
    let before = sheet.snapshot();
    let err = sheet.try_apply_edit("z9", "1").unwrap_err();
    assert_eq!(err, EditError::UnknownCell("z9".to_string()));
    assert_eq!(err.kind(), ErrorKind::Evaluation);
    assert_eq!(sheet.snapshot(), before);
}

#[test]
fn grid_bounds() {
    assert!(Sheet::new(SheetConfig::with_size(26, 2)).is_ok());
    assert_eq!(
        Sheet::new(SheetConfig::with_size(27, 2)).err(),
        Some(GridError::TooManyRows(27))
    );

    let sheet = Sheet::new(SheetConfig::with_size(26, 12)).unwrap();
    assert!(sheet.is_cell_name("z11"));
    assert_eq!(sheet.labels().count(), 26 * 12);
}

#[test]
fn long_edit_sequences_stay_consistent() {
    let mut sheet = sheet();
    sheet.apply_edit("a0", "1");
    for col in 1..4 {
        let prev = format!("a{}", col - 1);
        sheet.apply_edit(&format!("a{col}"), &format!("{prev} * 2"));
    }
    for row in ["b", "c", "d"] {
        for col in 0..4 {
            sheet.apply_edit(&format!("{row}{col}"), &format!("a{col} + {col}"));
        }
    }
    assert!(sheet.apply_edit("a0", "3"));
    assert_eq!(sheet.value("a3"), Some(&Value::Number(24.0)));
    assert_eq!(sheet.value("d3"), Some(&Value::Number(27.0)));
    assert!(sheet.inconsistent_cells().is_empty());
}
