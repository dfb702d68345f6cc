//! End-to-end tests for the primary phase.
//!
//! Each test runs a full `KnowledgeBase::import` over in-memory tables and
//! inspects the committed graph.

use pretty_assertions::assert_eq;
use ruslinkers::*;

const SYNTAX_HEADERS: [&str; 12] = [
    "linker", "semfield1_ed", "subfield1_ed", "source", "parts.num", "parts.order",
    "linker_position", "position.example", "clause.order", "clause order comments",
    "mainpart", "comment",
];

fn syntax(rows: &[[&str; 12]]) -> Table {
    Table::from_rows(SYNTAX_HEADERS, rows.iter().map(|r| r.iter().copied()))
}

fn no_data() -> Table {
    Table::from_rows(["form", "semfield1_ed", "dict"], Vec::<[&str; 3]>::new())
}

fn value_keywords(graph: &MemoryGraph, holder: Holder, parameter: &str) -> Vec<String> {
    let parameter = graph.parameter_by_keyword(parameter).unwrap();
    graph
        .values_for(holder, parameter)
        .into_iter()
        .map(|v| graph.value(v).unwrap().keyword.clone())
        .collect()
}

// ============================================================================
// 1. A primary row becomes one classified unit
// ============================================================================

#[test]
fn test_row_creates_classified_unit() {
    let kb = KnowledgeBase::open_memory();
    let syntax = syntax(&[
        ["а", "contrast", "NA", "ИМК", "mono", "NA", "NA", "NA", "NA", "NA", "NA", "NA"],
    ]);
    let report = kb.import(&syntax, &no_data(), &ImportConfig::default()).unwrap();
    assert_eq!(report.units_created, 1);

    let graph = kb.read();
    let units = graph.find_units_by_linker("а");
    assert_eq!(units.len(), 1);
    let unit = graph.unit(units[0]).unwrap();

    assert_eq!(unit.semfield, graph.semfield_by_keyword("contrast"));
    assert!(unit.subfields.is_empty());
    assert_eq!(value_keywords(&graph, Holder::Unit(unit.id), "parts.num"), vec!["mono".to_string()]);
    assert!(graph.parameter(graph.parameter_by_keyword("parts.num").unwrap()).unwrap().singleval);
    assert_eq!(kb.version(), 2, "one commit per phase");
}

#[test]
fn test_semantic_parameters_default_to_no() {
    let kb = KnowledgeBase::open_memory();
    let syntax = syntax(&[
        ["но", "contrast", "NA", "ИМК", "mono", "NA", "NA", "NA", "NA", "NA", "NA", "NA"],
    ]);
    kb.import(&syntax, &no_data(), &ImportConfig::default()).unwrap();

    let graph = kb.read();
    let unit = graph.find_units_by_linker("но")[0];
    for keyword in ["inferential", "illocutionary", "metatextual"] {
        assert_eq!(value_keywords(&graph, Holder::Unit(unit), keyword), vec!["no".to_string()]);
    }
}

#[test]
fn test_multi_valued_cell_and_shared_example() {
    let kb = KnowledgeBase::open_memory();
    let syntax = syntax(&[
        [
            "если", "condition", "NA", "ИМК", "mono", "NA", "initial; medial", "Если придёт, скажи.",
            "NA", "NA", "NA", "NA",
        ],
    ]);
    let report = kb.import(&syntax, &no_data(), &ImportConfig::default()).unwrap();

    let graph = kb.read();
    let unit = graph.find_units_by_linker("если")[0];
    let holder = Holder::Unit(unit);
    assert_eq!(
        value_keywords(&graph, holder, "linker_position"),
        vec!["initial".to_string(), "medial".to_string()]
    );

    let assignments = graph.assignments(holder).unwrap();
    let examples: Vec<_> = assignments
        .values
        .iter()
        .filter(|a| !a.examples.is_empty())
        .map(|a| a.examples.clone())
        .collect();
    assert_eq!(examples.len(), 2);
    assert_eq!(examples[0], examples[1]);
    assert_eq!(graph.stats().examples, 1);

    let notices: Vec<_> = report.for_row(Phase::Primary, 2).collect();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].kind, DiagnosticKind::Notice);
}

#[test]
fn test_mainpart_and_hidden_comments() {
    let kb = KnowledgeBase::open_memory();
    let syntax = syntax(&[
        [
            "потому что", "cause", "NA", "ИМК", "poly", "fixed", "NA", "NA", "NA", "NA",
            "потому; что", "уточнить; проверить по корпусу",
        ],
    ]);
    kb.import(&syntax, &no_data(), &ImportConfig::default()).unwrap();

    let graph = kb.read();
    let unit_id = graph.find_units_by_linker("потому что")[0];
    let mainpart = graph.form_type_by_keyword("mainpart").unwrap();
    assert_eq!(graph.form_texts(unit_id, mainpart), vec!["потому"]);

    let unit = graph.unit(unit_id).unwrap();
    let comments: Vec<_> = unit.comments.iter().map(|c| graph.comment(*c).unwrap()).collect();
    assert_eq!(comments.len(), 2);
    assert!(comments.iter().all(|c| c.hidden));
}

#[test]
fn test_clause_order_comment_attached() {
    let kb = KnowledgeBase::open_memory();
    let syntax = syntax(&[
        [
            "хотя", "concession", "NA", "ИМК", "mono", "NA", "NA", "NA", "p-q", "редко в постпозиции",
            "NA", "NA",
        ],
    ]);
    kb.import(&syntax, &no_data(), &ImportConfig::default()).unwrap();

    let graph = kb.read();
    let unit = graph.find_units_by_linker("хотя")[0];
    let holder = Holder::Unit(unit);
    let order = graph.parameter_by_keyword("clause.order").unwrap();
    let value = graph.values_for(holder, order)[0];
    let assignment = graph.assignments(holder).unwrap().value(value).unwrap();
    assert_eq!(assignment.comments.len(), 1);

    let comment = graph.comment(*assignment.comments.iter().next().unwrap()).unwrap();
    assert_eq!(comment.text, "редко в постпозиции");
}

// ============================================================================
// 2. Constraint violations
// ============================================================================

#[test]
fn test_single_value_parameter_rejects_second_value() {
    let mut graph = MemoryGraph::new();
    let parts = graph.declare_parameter(ParameterSpec::unit("parts.num", "количество компонентов")).unwrap();
    let mono = graph.declare_value(parts, "mono", "mono").unwrap();
    let poly = graph.declare_value(parts, "poly", "poly").unwrap();
    let unit = graph.create_unit("а");

    graph.assign_value(Holder::Unit(unit), mono).unwrap();
    let err = graph.assign_value(Holder::Unit(unit), poly).unwrap_err();
    match err {
        Error::ConstraintViolation(v) => {
            assert!(matches!(v.reason, Violation::SingleValueExceeded { .. }));
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(graph.values_for(Holder::Unit(unit), parts), vec![mono]);
}

#[test]
fn test_primary_violation_rolls_back_phase() {
    let kb = KnowledgeBase::open_memory();
    let syntax = syntax(&[
        ["а", "contrast", "NA", "ИМК", "mono", "NA", "NA", "NA", "NA", "NA", "NA", "NA"],
        ["но", "contrast", "NA", "ИМК", "mono; poly", "NA", "NA", "NA", "NA", "NA", "NA", "NA"],
    ]);
    let err = kb.import(&syntax, &no_data(), &ImportConfig::default()).unwrap_err();

    assert!(matches!(err, Error::ConstraintViolation(_)));
    assert_eq!(kb.version(), 0);
    let stats = kb.read().stats();
    assert_eq!(stats, GraphStats::default());
}

#[test]
fn test_repeated_token_does_not_abort_phase() {
    let kb = KnowledgeBase::open_memory();
    let syntax = syntax(&[
        ["а", "contrast", "NA", "ИМК", "mono", "NA", "initial", "NA", "NA", "NA", "NA", "NA"],
        ["но", "contrast", "NA", "ИМК", "mono", "NA", "initial; initial", "NA", "NA", "NA", "NA", "NA"],
    ]);
    let report = kb.import(&syntax, &no_data(), &ImportConfig::default()).unwrap();

    assert_eq!(report.units_created, 2);
    let notices: Vec<_> = report.for_row(Phase::Primary, 3).collect();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].kind, DiagnosticKind::Notice);
    assert_eq!(notices[0].field, "linker_position");

    let graph = kb.read();
    let no = graph.find_units_by_linker("но")[0];
    assert_eq!(value_keywords(&graph, Holder::Unit(no), "linker_position"), vec!["initial".to_string()]);
}

// ============================================================================
// 3. Missing references are reported, not fatal
// ============================================================================

#[test]
fn test_missing_references_warn() {
    let kb = KnowledgeBase::open_memory();
    let syntax = syntax(&[
        ["ибо", "NA", "NA", "NA", "mono", "NA", "NA", "NA", "NA", "NA", "NA", "NA"],
        ["зато", "contrast", "NA", "ЛОС", "mono", "NA", "NA", "NA", "NA", "NA", "NA", "NA"],
    ]);
    let report = kb.import(&syntax, &no_data(), &ImportConfig::default()).unwrap();

    assert_eq!(report.units_created, 2);
    assert_eq!(report.count(DiagnosticKind::ReferenceMissing), 3);

    let graph = kb.read();
    let ibo = graph.find_units_by_linker("ибо")[0];
    assert_eq!(graph.unit(ibo).unwrap().semfield, None);
    let zato = graph.find_units_by_linker("зато")[0];
    assert!(graph.unit(zato).unwrap().sources.is_empty());
}
