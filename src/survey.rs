use log::{debug, info, warn};

use leadership_scoring::*;
use snafu::{prelude::*, Snafu};

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

pub mod io_csv;
pub mod pii;
pub mod text;

use crate::survey::config_reader::*;
use crate::survey::pii::AnonymizedResponse;
use crate::survey::text::SentimentLexicon;

#[derive(Debug, Snafu)]
pub enum SurveyError {
    #[snafu(display("Error opening configuration file {path}"))]
    OpeningConfig {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error opening file"))]
    OpeningJson { source: std::io::Error },
    #[snafu(display("Error parsing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error opening survey file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading survey line {lineno}"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("Error writing {path}"))]
    CsvWrite { source: csv::Error, path: String },
    #[snafu(display("Error writing {path}"))]
    FileWrite {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display(""))]
    MissingParentDir {},

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type SurveyResult<T> = Result<T, SurveyError>;

pub mod config_reader {
    use crate::survey::*;

    #[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
    pub struct OutputSettings {
        #[serde(rename = "runName")]
        pub run_name: String,
        #[serde(rename = "insightsPath")]
        pub insights_path: Option<String>,
        #[serde(rename = "summaryPath")]
        pub summary_path: Option<String>,
        #[serde(rename = "piiMappingPath")]
        pub pii_mapping_path: Option<String>,
    }

    #[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
    pub struct SourceSettings {
        #[serde(rename = "filePath")]
        pub file_path: String,
        /// Original survey header -> short field name. Headers absent
        /// from this mapping are ignored.
        pub columns: HashMap<String, String>,
    }

    /// Short field names the pipeline reads after column renaming.
    #[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
    pub struct FieldSettings {
        pub name: String,
        pub phone: String,
        /// Field holding the project-scope awareness answer.
        pub scope: String,
        #[serde(rename = "primaryGroup")]
        pub primary_group: String,
        #[serde(rename = "alternateGroup")]
        pub alternate_group: String,
        pub intent: String,
        /// Field holding the externally computed topic id, when the
        /// input carries one.
        pub topic: Option<String>,
        /// The three leadership-relevant free-text fields, in order.
        #[serde(rename = "sentimentFields")]
        pub sentiment_fields: Vec<String>,
        #[serde(rename = "snippetField")]
        pub snippet_field: String,
    }

    /// The exact survey answers that declare each leadership intent.
    #[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
    pub struct IntentPhrases {
        pub direct: String,
        pub support: String,
        #[serde(rename = "executionOnly")]
        pub execution_only: String,
    }

    #[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
    pub struct Lexicon {
        pub positive: Vec<String>,
        pub negative: Vec<String>,
    }

    #[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
    pub struct SurveyConfig {
        #[serde(rename = "outputSettings")]
        pub output_settings: OutputSettings,
        pub source: SourceSettings,
        pub fields: FieldSettings,
        /// The closed group catalog, in order.
        pub groups: Vec<String>,
        #[serde(rename = "noAlternateAnswer")]
        pub no_alternate_answer: String,
        #[serde(rename = "intentPhrases")]
        pub intent_phrases: IntentPhrases,
        /// Scope answer that removes a respondent from the analysis.
        #[serde(rename = "exclusionAnswer")]
        pub exclusion_answer: Option<String>,
        /// Topic id (as a JSON object key) -> group name -> affinity
        /// weight.
        #[serde(rename = "topicAffinity", default)]
        pub topic_affinity: HashMap<String, HashMap<String, f64>>,
        pub lexicon: Lexicon,
        #[serde(rename = "typoCorrections", default)]
        pub typo_corrections: HashMap<String, String>,
    }

    pub fn read_config(path: &str) -> SurveyResult<SurveyConfig> {
        let contents = fs::read_to_string(path).context(OpeningConfigSnafu { path })?;
        let config: SurveyConfig =
            serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
        debug!("read_config: {:?}", config);
        Ok(config)
    }

    pub fn read_summary(path: String) -> SurveyResult<JSValue> {
        let contents = fs::read_to_string(path).context(OpeningJsonSnafu {})?;
        let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
        Ok(js)
    }
}

/// A survey response, as parsed by the readers: one renamed field per
/// mapped column. This is before anonymization and validation.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ParsedResponse {
    /// 1-based line number in the source file, for error reporting.
    pub lineno: usize,
    pub fields: HashMap<String, String>,
}

impl ParsedResponse {
    /// Field content, with a missing field reading as empty.
    pub fn field(&self, name: &str) -> &str {
        self.fields.get(name).map(String::as_str).unwrap_or("")
    }
}

// Drops respondents whose scope answer matches the configured exclusion
// literal. Runs after id assignment, so excluded respondents still
// consume ids and ids stay stable across reruns.
fn filter_active(
    responses: Vec<AnonymizedResponse>,
    config: &SurveyConfig,
) -> Vec<AnonymizedResponse> {
    let exclusion = match &config.exclusion_answer {
        Some(x) => x,
        None => return responses,
    };
    let initial = responses.len();
    let active: Vec<AnonymizedResponse> = responses
        .into_iter()
        .filter(|r| r.field(&config.fields.scope).trim() != exclusion.as_str())
        .collect();
    info!(
        "Removed {:?} respondents who do not wish to continue; {:?} active respondents remain",
        initial - active.len(),
        active.len()
    );
    active
}

// Turns anonymized responses into core participant records: intent
// phrase matching, topic parsing, sentiment labels (precomputed column
// if present, lexicon otherwise) and the cleaned contribution snippet.
fn validate_responses(
    responses: &[AnonymizedResponse],
    names: &HashMap<u32, String>,
    config: &SurveyConfig,
    lexicon: &SentimentLexicon,
) -> Vec<Participant> {
    let fields = &config.fields;
    let mut res: Vec<Participant> = Vec::new();

    for r in responses.iter() {
        let intent_answer = r.field(&fields.intent).trim();
        let intent = if intent_answer == config.intent_phrases.direct {
            LeadershipIntent::Direct
        } else if intent_answer == config.intent_phrases.support {
            LeadershipIntent::Support
        } else {
            if intent_answer != config.intent_phrases.execution_only && !intent_answer.is_empty() {
                debug!(
                    "validate_responses: line {:?}: unrecognized intent answer {:?}",
                    r.lineno, intent_answer
                );
            }
            LeadershipIntent::ExecutionOnly
        };

        let topic: Option<u32> = fields
            .topic
            .as_ref()
            .and_then(|f| r.field(f).trim().parse::<u32>().ok());

        let sentiments: Vec<Sentiment> = fields
            .sentiment_fields
            .iter()
            .map(|f| {
                // A precomputed label column wins over the lexicon.
                let label_col = format!("{}_sentiment", f);
                let label = r.field(&label_col);
                if !label.is_empty() {
                    text::parse_sentiment_label(label).unwrap_or_else(|| {
                        warn!(
                            "validate_responses: line {:?}: unknown sentiment label {:?}",
                            r.lineno, label
                        );
                        Sentiment::Neutral
                    })
                } else {
                    let cleaned =
                        text::clean_text(&text::correct_typos(r.field(f), &config.typo_corrections));
                    lexicon.classify(&cleaned)
                }
            })
            .collect();

        let snippet = text::clean_text(&text::correct_typos(
            r.field(&fields.snippet_field),
            &config.typo_corrections,
        ));

        let label = names
            .get(&r.id)
            .cloned()
            .unwrap_or_else(|| format!("ID_{}", r.id));

        res.push(Participant {
            id: r.id,
            label,
            primary_group: r.field(&fields.primary_group).trim().to_string(),
            alternate_group: r.field(&fields.alternate_group).trim().to_string(),
            intent,
            topic,
            sentiments,
            snippet,
        });
    }
    res
}

fn build_affinity_table(config: &SurveyConfig) -> AffinityTable {
    let mut table = AffinityTable::new();
    for (topic_s, row) in config.topic_affinity.iter() {
        match topic_s.parse::<u32>() {
            Ok(topic) => {
                for (group, weight) in row.iter() {
                    table.insert(topic, group, *weight);
                }
            }
            Err(_) => {
                warn!(
                    "build_affinity_table: ignoring non-numeric topic key {:?}",
                    topic_s
                );
            }
        }
    }
    table
}

fn intent_tag(intent: LeadershipIntent) -> &'static str {
    match intent {
        LeadershipIntent::Direct => "direct",
        LeadershipIntent::Support => "support",
        LeadershipIntent::ExecutionOnly => "execution-only",
    }
}

const INSIGHT_HEADERS: [&str; 11] = [
    "participant_id",
    "declared_intent",
    "primary_group",
    "alternate_group",
    "suggested_group",
    "suggestion_type",
    "final_status",
    "aptitude_score",
    "topic_justification",
    "sentiment_justification",
    "contribution_snippet",
];

fn insight_row(r: &LeadershipResult) -> Vec<String> {
    vec![
        r.participant_id.to_string(),
        intent_tag(r.intent).to_string(),
        r.primary_group.clone(),
        r.alternate_group.clone(),
        r.suggested_group.clone().unwrap_or_default(),
        r.suggestion.map(|s| s.to_string()).unwrap_or_default(),
        r.status.to_string(),
        format!("{:.2}", r.aptitude_score),
        r.topic_label.clone(),
        r.sentiment_label.clone(),
        r.snippet.clone(),
    ]
}

fn write_insights(path: &str, results: &[LeadershipResult]) -> SurveyResult<()> {
    if path == "stdout" {
        let stdout = std::io::stdout();
        let mut wtr = csv::Writer::from_writer(stdout.lock());
        write_insight_records(&mut wtr, results, path)?;
        return Ok(());
    }
    let mut wtr = csv::Writer::from_path(path).context(CsvWriteSnafu { path })?;
    write_insight_records(&mut wtr, results, path)?;
    info!("Leadership insights written to {:?}", path);
    Ok(())
}

fn write_insight_records<W: Write>(
    wtr: &mut csv::Writer<W>,
    results: &[LeadershipResult],
    path: &str,
) -> SurveyResult<()> {
    wtr.write_record(INSIGHT_HEADERS)
        .context(CsvWriteSnafu { path })?;
    for r in results.iter() {
        wtr.write_record(insight_row(r))
            .context(CsvWriteSnafu { path })?;
    }
    wtr.flush().context(FileWriteSnafu { path })?;
    Ok(())
}

fn build_summary_js(config: &SurveyConfig, res: &AnalysisResult) -> JSValue {
    let mut status_counts: HashMap<String, u64> = HashMap::new();
    for r in res.results.iter() {
        *status_counts.entry(r.status.to_string()).or_insert(0) += 1;
    }
    // Sorted keys keep the summary byte-stable across runs.
    let mut counts: JSMap<String, JSValue> = JSMap::new();
    let mut keys: Vec<&String> = status_counts.keys().collect();
    keys.sort();
    for k in keys {
        counts.insert(k.clone(), json!(status_counts[k]));
    }

    let groups: Vec<JSValue> = res
        .groups
        .iter()
        .map(|g| {
            let leader = g.leader.as_ref().map(|l| {
                json!({
                    "participantId": l.participant_id,
                    "label": l.label,
                    "assignment": l.kind.to_string(),
                })
            });
            let unassigned: Vec<JSValue> = g
                .unassigned_direct
                .iter()
                .map(|(id, label)| json!({"participantId": id, "label": label}))
                .collect();
            json!({
                "name": g.name,
                "leader": leader,
                "unassignedDirect": unassigned,
            })
        })
        .collect();

    json!({
        "config": {
            "runName": config.output_settings.run_name,
            "groups": config.groups,
        },
        "participants": res.results.len(),
        "statusCounts": counts,
        "groups": groups,
        "gapGroups": res.gap_groups,
    })
}

// Relative paths in the configuration resolve against the directory
// holding the configuration file.
fn resolve_path(root: &Path, path: &str) -> String {
    let p = Path::new(path);
    if p.is_absolute() {
        path.to_string()
    } else {
        root.join(p).display().to_string()
    }
}

/// Runs the full pipeline: ingestion, anonymization, scope filtering,
/// validation, the two-pass leadership analysis and the exports.
pub fn run_analysis(
    config_path: String,
    input_override: Option<String>,
    out_override: Option<String>,
    pii_out_override: Option<String>,
    check_summary_path: Option<String>,
) -> SurveyResult<()> {
    let config_p = Path::new(config_path.as_str());
    let config = read_config(config_path.as_str())?;
    info!("config: {:?}", config.output_settings);

    let root_p = config_p.parent().context(MissingParentDirSnafu {})?;

    let input_path =
        input_override.unwrap_or_else(|| resolve_path(root_p, &config.source.file_path));
    let responses = io_csv::read_survey_csv(&input_path, &config.source.columns)?;
    info!("Read {:?} survey responses from {:?}", responses.len(), input_path);

    let (anonymized, pii_records) = pii::pseudonymize(&responses, &config.fields);
    let pii_path = pii_out_override.or_else(|| {
        config
            .output_settings
            .pii_mapping_path
            .as_ref()
            .map(|p| resolve_path(root_p, p))
    });
    if let Some(p) = pii_path {
        pii::write_pii_mapping(&p, &pii_records)?;
    }

    let active = filter_active(anonymized, &config);

    let names: HashMap<u32, String> = pii_records
        .iter()
        .map(|r| (r.participant_id, r.name.clone()))
        .collect();
    let lexicon = SentimentLexicon::new(&config.lexicon.positive, &config.lexicon.negative);
    let participants = validate_responses(&active, &names, &config, &lexicon);

    let catalog = match GroupCatalog::new(&config.groups, &config.no_alternate_answer) {
        Ok(c) => c,
        Err(e) => {
            whatever!("Invalid group catalog: {:?}", e)
        }
    };
    let affinity = build_affinity_table(&config);

    let res = match run_leadership_analysis(&participants, &catalog, &affinity) {
        Ok(r) => r,
        Err(e) => {
            whatever!("Analysis error: {:?}", e)
        }
    };
    if res.results.is_empty() {
        warn!("No data: the run produced an empty result set");
    }

    let insights_path = out_override.or_else(|| {
        config
            .output_settings
            .insights_path
            .as_ref()
            .map(|p| resolve_path(root_p, p))
    });
    if let Some(p) = insights_path {
        write_insights(&p, &res.results)?;
    }

    let summary_js = build_summary_js(&config, &res);
    let pretty_js = serde_json::to_string_pretty(&summary_js).context(ParsingJsonSnafu {})?;
    match &config.output_settings.summary_path {
        Some(p) => {
            let sp = resolve_path(root_p, p);
            fs::write(&sp, &pretty_js).context(FileWriteSnafu { path: sp.clone() })?;
            info!("Run summary written to {:?}", sp);
        }
        None => {
            println!("summary:{}", pretty_js);
        }
    }

    // The reference summary, if provided for comparison
    if let Some(summary_p) = check_summary_path {
        let summary_ref = read_summary(summary_p)?;
        let pretty_js_ref = serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
        if pretty_js_ref != pretty_js {
            warn!("Found differences with the reference summary");
            print_diff(pretty_js_ref.as_str(), pretty_js.as_ref(), "\n");
            whatever!("Difference detected between calculated summary and reference summary")
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> SurveyConfig {
        let js = r#"{
            "outputSettings": { "runName": "checkin-test" },
            "source": {
                "filePath": "checkin.csv",
                "columns": {
                    "1. Como podemos te chamar?": "nome_completo",
                    "2. Qual seu telefone whatsapp?": "telefone_whatsapp",
                    "4.a. Opção principal": "grupo_principal",
                    "4.b. Opção alternativa": "grupo_alternativo",
                    "5. Você gostaria de exercer algum tipo de liderança?": "interesse_lideranca",
                    "8. O que você trás na sua bagagem?": "bagagem_contribuicao"
                }
            },
            "fields": {
                "name": "nome_completo",
                "phone": "telefone_whatsapp",
                "scope": "consciencia_escopo",
                "primaryGroup": "grupo_principal",
                "alternateGroup": "grupo_alternativo",
                "intent": "interesse_lideranca",
                "topic": "main_topic",
                "sentimentFields": ["objetivo_proposito", "bagagem_contribuicao", "compromisso_pessoal"],
                "snippetField": "bagagem_contribuicao"
            },
            "groups": ["G1 - Automações Wix", "G2 - API de Orquestração"],
            "noAlternateAnswer": "Não tenho interesse por nenhuma outra opção",
            "intentPhrases": {
                "direct": "Sim, me sinto a vontade estando a frente e guiando o grupo",
                "support": "Sim, me sinto a vontade ajudando quem estiver a frente do grupo",
                "executionOnly": "Não, quero apenas executar as atividades"
            },
            "exclusionAnswer": "Não quero continuar no projeto.",
            "topicAffinity": { "4": { "G2 - API de Orquestração": 0.8 } },
            "lexicon": {
                "positive": ["aprender", "contribuir"],
                "negative": ["medo", "dúvidas"]
            },
            "typoCorrections": { "progamação": "programação" }
        }"#;
        serde_json::from_str(js).unwrap()
    }

    fn response(id: u32, pairs: &[(&str, &str)]) -> AnonymizedResponse {
        AnonymizedResponse {
            id,
            lineno: id as usize + 1,
            fields: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn config_round_trips_from_json() {
        let config = test_config();
        assert_eq!(config.groups.len(), 2);
        assert_eq!(config.fields.sentiment_fields.len(), 3);
        assert_eq!(
            config.topic_affinity["4"]["G2 - API de Orquestração"],
            0.8
        );
    }

    #[test]
    fn validation_maps_intent_phrases_and_topic() {
        let config = test_config();
        let lexicon = SentimentLexicon::new(&config.lexicon.positive, &config.lexicon.negative);
        let responses = vec![
            response(
                1,
                &[
                    (
                        "interesse_lideranca",
                        "Sim, me sinto a vontade estando a frente e guiando o grupo",
                    ),
                    ("grupo_principal", "G1 - Automações Wix"),
                    ("grupo_alternativo", "Não tenho interesse por nenhuma outra opção"),
                    ("main_topic", "4"),
                ],
            ),
            response(
                2,
                &[
                    ("interesse_lideranca", "something unexpected"),
                    ("grupo_principal", "G2 - API de Orquestração"),
                    ("main_topic", "not a number"),
                ],
            ),
        ];
        let names = HashMap::new();
        let ps = validate_responses(&responses, &names, &config, &lexicon);

        assert_eq!(ps[0].intent, LeadershipIntent::Direct);
        assert_eq!(ps[0].topic, Some(4));
        assert_eq!(ps[0].label, "ID_1");
        assert_eq!(ps[1].intent, LeadershipIntent::ExecutionOnly);
        assert_eq!(ps[1].topic, None);
        // Missing alternate answer stays empty and can never match a
        // catalog group.
        assert_eq!(ps[1].alternate_group, "");
    }

    #[test]
    fn precomputed_sentiment_column_wins_over_the_lexicon() {
        let config = test_config();
        let lexicon = SentimentLexicon::new(&config.lexicon.positive, &config.lexicon.negative);
        let responses = vec![response(
            1,
            &[
                ("objetivo_proposito", "tenho medo e dúvidas"),
                ("objetivo_proposito_sentiment", "Positivo"),
                ("bagagem_contribuicao", "quero aprender e contribuir"),
            ],
        )];
        let ps = validate_responses(&responses, &HashMap::new(), &config, &lexicon);
        assert_eq!(ps[0].sentiments[0], Sentiment::Positive);
        assert_eq!(ps[0].sentiments[1], Sentiment::Positive);
        assert_eq!(ps[0].sentiments[2], Sentiment::Neutral);
    }

    #[test]
    fn scope_filter_drops_leavers_but_keeps_their_ids() {
        let config = test_config();
        let responses = vec![
            response(1, &[("consciencia_escopo", "Não quero continuar no projeto.")]),
            response(2, &[("consciencia_escopo", "Estou ciente do escopo")]),
        ];
        let active = filter_active(responses, &config);
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, 2);
    }

    #[test]
    fn affinity_table_skips_bad_topic_keys() {
        let mut config = test_config();
        config
            .topic_affinity
            .insert("not-a-topic".to_string(), HashMap::new());
        let table = build_affinity_table(&config);
        assert_eq!(table.weight(4, "G2 - API de Orquestração"), Some(0.8));
    }

    #[test]
    fn insight_rows_render_nullable_fields_as_empty() {
        let r = LeadershipResult {
            participant_id: 3,
            intent: LeadershipIntent::Support,
            primary_group: "G1 - Automações Wix".to_string(),
            alternate_group: "".to_string(),
            suggested_group: None,
            suggestion: None,
            status: FinalStatus::SupportNoStrongMatch,
            aptitude_score: 0.0,
            topic_label: "N/A".to_string(),
            sentiment_label: "Neutral/Neutral".to_string(),
            snippet: String::new(),
        };
        let row = insight_row(&r);
        assert_eq!(row[0], "3");
        assert_eq!(row[1], "support");
        assert_eq!(row[4], "");
        assert_eq!(row[6], "Support interest, no strong match");
        assert_eq!(row[7], "0.00");
    }
}
