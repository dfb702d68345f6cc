//! Fixed declarations made before the first primary row.
//!
//! The parameter catalog is static: which columns become parameters, their
//! display names, valuedness and the columns holding their examples.
//! Vocabularies are derived from the data.

use hashbrown::HashSet;
use tracing::{debug, info};

use crate::config::ImportConfig;
use crate::model::*;
use crate::schema::{declare_vocabulary, ParameterSpec, TextParameterSpec};
use crate::storage::{GraphRead, MemoryGraph};
use crate::table::Table;
use crate::Result;
use super::columns;

// ============================================================================
// Static catalog
// ============================================================================

/// A unit parameter whose vocabulary is read from the column of the same
/// name.
#[derive(Debug)]
pub struct VocabularyColumn {
    pub keyword: &'static str,
    pub name: &'static str,
    pub singleval: bool,
    /// Column with an example for the parameter's assignments.
    pub example: Option<&'static str>,
    /// Column with a comment for the parameter's assignments.
    pub comment: Option<&'static str>,
}

pub static SYNTACTIC_PARAMETERS: [VocabularyColumn; 7] = [
    VocabularyColumn { keyword: "parts.num", name: "количество компонентов", singleval: true, example: None, comment: None },
    VocabularyColumn { keyword: "parts.order", name: "порядок компонентов", singleval: true, example: Some("parts.order.example"), comment: None },
    VocabularyColumn { keyword: "linker_position", name: "позиция коннектора", singleval: false, example: Some("position.example"), comment: None },
    VocabularyColumn { keyword: "clause.order", name: "порядок клауз", singleval: false, example: Some("clause.order.example"), comment: Some("clause order comments") },
    VocabularyColumn { keyword: "dep.clause.type", name: "тип зависимой клаузы", singleval: false, example: None, comment: None },
    VocabularyColumn { keyword: "indep.sentence", name: "используется в независимом предложении", singleval: true, example: Some("indep.sentence.example"), comment: None },
    VocabularyColumn { keyword: "linker_position_exclusivity", name: "единственность позиции", singleval: true, example: None, comment: None },
];

/// A unit text parameter read verbatim from the column of the same name.
#[derive(Debug)]
pub struct TextColumn {
    pub keyword: &'static str,
    pub name: &'static str,
}

pub static TEXT_PARAMETERS: [TextColumn; 3] = [
    TextColumn { keyword: "expansion", name: "возможность расширения" },
    TextColumn { keyword: "comp.oblig", name: "обязательность компонентов" },
    TextColumn { keyword: "dep.clause.type", name: "тип зависимой клаузы" },
];

/// A yes/no semantic parameter: `yes` when the example column is filled.
#[derive(Debug)]
pub struct SemanticColumn {
    pub keyword: &'static str,
    pub name: &'static str,
    pub example: &'static str,
}

pub static SEMANTIC_PARAMETERS: [SemanticColumn; 3] = [
    SemanticColumn { keyword: "inferential", name: "инферентивное прочтение", example: "inferential.example" },
    SemanticColumn { keyword: "illocutionary", name: "иллокутивное прочтение", example: "illoc example" },
    SemanticColumn { keyword: "metatextual", name: "метатекстовое прочтение", example: "metatext example" },
];

pub const SEMANTIC_YES: (&str, &str) = ("yes", "возможно");
pub const SEMANTIC_NO: (&str, &str) = ("no", "не засвидетельствовано");

pub const FORM_CORREL: (&str, &str) = ("correl", "коррелят");
pub const FORM_PHONVAR: (&str, &str) = ("phonvar", "фонетический вариант");
pub const FORM_MAINPART: (&str, &str) = ("mainpart", "основной компонент");

pub const CORREL_POSITION_NAME: &str = "позиция коррелята";
pub const CORREL_OBLIG_NAME: &str = "обязательность коррелята";

pub const LINK_HYPERLINK: (&str, &str) = ("hyperlink", "перекрёстная ссылка");

// ============================================================================
// Context
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub struct SyntacticParameter {
    pub column: &'static VocabularyColumn,
    pub id: ParameterId,
}

#[derive(Debug, Clone, Copy)]
pub struct TextColumnParameter {
    pub column: &'static TextColumn,
    pub id: TextParameterId,
}

#[derive(Debug, Clone, Copy)]
pub struct SemanticParameter {
    pub column: &'static SemanticColumn,
    pub id: ParameterId,
    pub yes: ValueId,
    pub no: ValueId,
}

/// Ids of everything the catalog declared, shared by both phases.
#[derive(Debug, Clone)]
pub struct ImportContext {
    pub correl: FormTypeId,
    pub phonvar: FormTypeId,
    pub mainpart: FormTypeId,
    pub syntactic: Vec<SyntacticParameter>,
    pub text: Vec<TextColumnParameter>,
    pub semantic: Vec<SemanticParameter>,
    pub correl_position: ParameterId,
    pub correl_oblig: TextParameterId,
    pub fallback_source: SourceId,
}

// ============================================================================
// Bootstrap
// ============================================================================

/// Declare the taxonomy, sources and schema, then seal the schema.
pub fn bootstrap(
    graph: &mut MemoryGraph,
    syntax: &Table,
    data: &Table,
    config: &ImportConfig,
) -> Result<ImportContext> {
    register_taxonomy(graph, syntax)?;
    let fallback_source = register_sources(graph, data, &config.fallback_source)?;

    let correl = graph.declare_form_type(FORM_CORREL.0, FORM_CORREL.1)?;
    let phonvar = graph.declare_form_type(FORM_PHONVAR.0, FORM_PHONVAR.1)?;
    let mainpart = graph.declare_form_type(FORM_MAINPART.0, FORM_MAINPART.1)?;

    let mut syntactic = Vec::with_capacity(SYNTACTIC_PARAMETERS.len());
    for column in &SYNTACTIC_PARAMETERS {
        let mut spec = ParameterSpec::unit(column.keyword, column.name);
        if !column.singleval {
            spec = spec.multi();
        }
        let id = declare_vocabulary(graph, spec, syntax)?;
        syntactic.push(SyntacticParameter { column, id });
    }

    let mut text = Vec::with_capacity(TEXT_PARAMETERS.len());
    for column in &TEXT_PARAMETERS {
        let id = graph.declare_text_parameter(TextParameterSpec::unit(column.keyword, column.name))?;
        text.push(TextColumnParameter { column, id });
    }

    let mut semantic = Vec::with_capacity(SEMANTIC_PARAMETERS.len());
    for column in &SEMANTIC_PARAMETERS {
        let id = graph.declare_parameter(ParameterSpec::unit(column.keyword, column.name).semantic())?;
        let yes = graph.declare_value(id, SEMANTIC_YES.0, SEMANTIC_YES.1)?;
        let no = graph.declare_value(id, SEMANTIC_NO.0, SEMANTIC_NO.1)?;
        semantic.push(SemanticParameter { column, id, yes, no });
    }

    let correl_position = declare_vocabulary(
        graph,
        ParameterSpec::form(columns::CORREL_POSITION, CORREL_POSITION_NAME).multi(),
        syntax,
    )?;
    graph.restrict_to_form_type(correl_position, correl)?;
    let correl_oblig = graph.declare_text_parameter(
        TextParameterSpec::form(columns::CORREL_OBLIG, CORREL_OBLIG_NAME),
    )?;

    graph.seal_schema();
    info!(stats = ?graph.stats(), "schema sealed");

    Ok(ImportContext {
        correl,
        phonvar,
        mainpart,
        syntactic,
        text,
        semantic,
        correl_position,
        correl_oblig,
        fallback_source,
    })
}

/// Semantic fields of the primary rows, with the sub-fields listed next to
/// them. Sub-fields of a row without a field are not registered.
fn register_taxonomy(graph: &mut MemoryGraph, syntax: &Table) -> Result<()> {
    for row in syntax.rows() {
        let Some(keyword) = row.present(columns::SEMFIELD) else { continue };
        let semfield = graph.get_or_create_semfield(keyword);
        for subfield in row.tokens(columns::SUBFIELD) {
            graph.get_or_create_subfield(subfield, semfield)?;
        }
    }
    Ok(())
}

/// Sources named in the secondary `dict` column, in first-seen order, then
/// the fallback source.
fn register_sources(graph: &mut MemoryGraph, data: &Table, fallback: &str) -> Result<SourceId> {
    let mut seen = HashSet::new();
    for row in data.rows() {
        if let Some(keyword) = row.present(columns::DICT) {
            if seen.insert(keyword) {
                graph.create_source(keyword, keyword)?;
            }
        }
    }
    match graph.source_by_keyword(fallback) {
        Some(id) => Ok(id),
        None => {
            debug!(source = fallback, "registering fallback source");
            graph.create_source(fallback, fallback)
        }
    }
}
