//! End-to-end tests for the secondary phase: resolution, merge and the
//! per-row skip rule.

use pretty_assertions::assert_eq;
use ruslinkers::*;

// ============================================================================
// Fixtures
// ============================================================================

/// Primary dataset shared by every test:
///
/// | line | linker     | field    | sub-field  |
/// |------|------------|----------|------------|
/// | 2    | а          | contrast | opposition |
/// | 3    | а          | contrast | concession |
/// | 4    | но         | contrast | opposition |
/// | 5    | а          | cause    |            |
/// | 6    | потому что | cause    |            |
fn syntax() -> Table {
    Table::from_rows(
        ["linker", "semfield1_ed", "subfield1_ed", "source"],
        [
            ["а", "contrast", "opposition", "ИМК"],
            ["а", "contrast", "concession", "ИМК"],
            ["но", "contrast", "opposition", "ИМК"],
            ["а", "cause", "NA", "ИМК"],
            ["потому что", "cause", "NA", "ИМК"],
        ],
    )
}

const DATA_HEADERS: [&str; 12] = [
    "form", "edit form", "Non-connector", "semfield1_ed", "subfield1_ed", "dict",
    "hyperlink", "phonvar", "meaning", "sem_comment", "inside_info", "Example",
];

#[derive(Clone, Copy)]
struct Row<'a> {
    form: &'a str,
    edit_form: &'a str,
    non_connector: &'a str,
    semfield: &'a str,
    subfield: &'a str,
    dict: &'a str,
    hyperlink: &'a str,
    phonvar: &'a str,
    meaning: &'a str,
    sem_comment: &'a str,
    inside_info: &'a str,
    example: &'a str,
}

impl<'a> Row<'a> {
    fn new(form: &'a str, semfield: &'a str, subfield: &'a str) -> Self {
        Self {
            form,
            edit_form: "NA",
            non_connector: "NA",
            semfield,
            subfield,
            dict: "",
            hyperlink: "NA",
            phonvar: "NA",
            meaning: "NA",
            sem_comment: "NA",
            inside_info: "NA",
            example: "NA",
        }
    }

    fn cells(&self) -> [&'a str; 12] {
        [
            self.form, self.edit_form, self.non_connector, self.semfield, self.subfield, self.dict,
            self.hyperlink, self.phonvar, self.meaning, self.sem_comment, self.inside_info, self.example,
        ]
    }
}

fn data(rows: &[Row]) -> Table {
    Table::from_rows(DATA_HEADERS, rows.iter().map(Row::cells))
}

fn import(rows: &[Row]) -> (KnowledgeBase, ImportReport) {
    let kb = KnowledgeBase::open_memory();
    let report = kb.import(&syntax(), &data(rows), &ImportConfig::default()).unwrap();
    (kb, report)
}

/// Units named `linker`, in creation order.
fn units(kb: &KnowledgeBase, linker: &str) -> Vec<UnitId> {
    kb.read().find_units_by_linker(linker)
}

// ============================================================================
// 1. Resolution
// ============================================================================

#[test]
fn test_unknown_semfield_skips_row_without_mutation() {
    let (baseline, _) = import(&[]);
    let ghost = Row {
        phonvar: "а-а",
        sem_comment: "не учитывать",
        example: "Пример.",
        meaning: "союз",
        ..Row::new("а", "ghost", "NA")
    };
    let (kb, report) = import(&[ghost]);

    assert_eq!(report.rows_skipped, 1);
    assert_eq!(report.rows_merged, 0);
    let diagnostic = &report.diagnostics[0];
    assert_eq!(diagnostic.kind, DiagnosticKind::ReferenceMissing);
    assert_eq!(diagnostic.phase, Phase::Secondary);
    assert_eq!(diagnostic.row, 2);
    assert_eq!(diagnostic.field, "semfield1_ed");

    assert_eq!(kb.read().stats(), baseline.read().stats());
}

#[test]
fn test_subfield_selects_single_unit() {
    let row = Row { meaning: "противопоставление", ..Row::new("а", "contrast", "concession") };
    let (kb, report) = import(&[row]);
    assert_eq!(report.rows_merged, 1);

    let candidates = units(&kb, "а");
    let graph = kb.read();
    let meaning = graph.meanings().next().unwrap();
    assert_eq!(meaning.unit, candidates[1]);
    assert_eq!(meaning.sense.meaning, "противопоставление");
}

#[test]
fn test_ambiguous_row_is_skipped() {
    let (kb, report) = import(&[Row { meaning: "союз", ..Row::new("а", "contrast", "NA") }]);

    assert_eq!(report.rows_skipped, 1);
    assert_eq!(report.count(DiagnosticKind::AmbiguousMatch), 1);
    assert_eq!(kb.read().stats().meanings, 0);
}

#[test]
fn test_unknown_form_is_skipped() {
    let (_, report) = import(&[Row::new("ибо", "cause", "NA"), Row::new("а", "cause", "NA")]);

    assert_eq!(report.rows_skipped, 1);
    assert_eq!(report.rows_merged, 1);
    let skipped: Vec<_> = report.for_row(Phase::Secondary, 2).collect();
    assert_eq!(skipped.len(), 1);
    assert_eq!(skipped[0].linker, "ибо");
}

// ============================================================================
// 2. Cross-references
// ============================================================================

#[test]
fn test_repeated_row_does_not_duplicate_link() {
    let row = Row { hyperlink: "но", ..Row::new("а", "contrast", "concession") };
    let (kb, report) = import(&[row, row]);

    assert_eq!(report.rows_merged, 2);
    assert_eq!(report.links_created, 1);

    let source = units(&kb, "а")[1];
    let target = units(&kb, "но")[0];
    let graph = kb.read();
    assert_eq!(graph.stats().links, 1);
    assert!(graph.has_link(source, target));
    assert_eq!(graph.stats().meanings, 2, "each row still adds its meaning");
}

#[test]
fn test_link_target_narrowed_by_field() {
    let narrowed = Row { hyperlink: "а", ..Row::new("потому что", "cause", "NA") };
    let ambiguous = Row { hyperlink: "а", ..Row::new("но", "contrast", "opposition") };
    let (kb, report) = import(&[narrowed, ambiguous]);

    assert_eq!(report.rows_merged, 2);
    assert_eq!(report.links_created, 1);

    let warnings: Vec<_> = report.for_row(Phase::Secondary, 3).collect();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].kind, DiagnosticKind::AmbiguousMatch);
    assert_eq!(warnings[0].field, "hyperlink");

    let source = units(&kb, "потому что")[0];
    let target = units(&kb, "а")[2];
    let graph = kb.read();
    assert!(graph.has_link(source, target));
    let hyperlink = graph.link_type_by_keyword("hyperlink").unwrap();
    assert_eq!(graph.links().next().unwrap().link_type, hyperlink);
}

// ============================================================================
// 3. Enrichment
// ============================================================================

#[test]
fn test_phonetic_variants_deduplicated() {
    let row = Row { edit_form: "а", phonvar: "а-а", ..Row::new("а-а", "contrast", "concession") };
    let (kb, report) = import(&[row, row]);
    assert_eq!(report.rows_merged, 2);

    let unit = units(&kb, "а")[1];
    let graph = kb.read();
    let phonvar = graph.form_type_by_keyword("phonvar").unwrap();
    assert_eq!(graph.form_texts(unit, phonvar), vec!["а-а"]);
}

#[test]
fn test_comments_and_examples_reused_by_text() {
    let first = Row {
        sem_comment: "противительное",
        inside_info: "сверить",
        example: "Он пришёл, а она нет.",
        ..Row::new("а", "contrast", "concession")
    };
    let second = Row {
        sem_comment: "противительное",
        example: "Он пришёл, а она нет.",
        ..Row::new("но", "contrast", "opposition")
    };
    let (kb, _) = import(&[first, second]);

    let a = units(&kb, "а")[1];
    let no = units(&kb, "но")[0];
    let graph = kb.read();
    assert_eq!(graph.stats().comments, 2);
    assert_eq!(graph.stats().examples, 1);

    let shared = graph.find_comment_by_text("противительное").unwrap();
    assert!(!graph.comment(shared).unwrap().hidden);
    assert!(graph.unit(a).unwrap().comments.contains(&shared));
    assert!(graph.unit(no).unwrap().comments.contains(&shared));

    let note = graph.find_comment_by_text("сверить").unwrap();
    assert!(graph.comment(note).unwrap().hidden);
    assert_eq!(graph.unit(a).unwrap().sem_comment.as_deref(), Some("противительное"));
}

#[test]
fn test_meaning_source_falls_back() {
    let cited = Row { dict: "БАС", meaning: "противительный союз", ..Row::new("но", "contrast", "opposition") };
    let uncited = Row { meaning: "сопоставительный союз", ..Row::new("а", "cause", "NA") };
    let (kb, _) = import(&[cited, uncited]);

    let graph = kb.read();
    let sources: Vec<&str> = graph
        .meanings()
        .map(|m| graph.source(m.source).unwrap().keyword.as_str())
        .collect();
    assert_eq!(sources, vec!["БАС", "ИМК"]);
}

#[test]
fn test_non_connector_filter() {
    let dropped = Row { non_connector: "yes", ..Row::new("но", "contrast", "opposition") };
    let kept = Row { non_connector: "объед", ..Row::new("а", "cause", "NA") };
    let (kb, report) = import(&[dropped, kept]);

    assert_eq!(report.rows_filtered, 1);
    assert_eq!(report.rows_merged, 1);
    assert!(report.diagnostics.is_empty());
    assert_eq!(kb.read().stats().meanings, 1);
}

#[test]
fn test_skipped_row_keeps_committed_primary_phase() {
    let (kb, report) = import(&[Row::new("а", "ghost", "NA")]);

    assert_eq!(report.units_created, 5);
    assert_eq!(kb.version(), 2);
    assert_eq!(kb.read().stats().units, 5);
}
