// PII handling: pseudonymization and the restricted id-to-name mapping.

use std::collections::HashMap;

use log::{info, warn};
use snafu::prelude::*;

use crate::survey::config_reader::FieldSettings;
use crate::survey::{CsvWriteSnafu, FileWriteSnafu, ParsedResponse, SurveyResult};

/// One entry of the restricted id-to-name mapping. This data must never
/// leave the organizing team.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct PiiRecord {
    pub participant_id: u32,
    pub name: String,
}

/// A survey response after pseudonymization: sequential participant id,
/// name and phone fields removed.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct AnonymizedResponse {
    pub id: u32,
    pub lineno: usize,
    pub fields: HashMap<String, String>,
}

impl AnonymizedResponse {
    pub fn field(&self, name: &str) -> &str {
        self.fields.get(name).map(String::as_str).unwrap_or("")
    }
}

/// Assigns participant ids in input order starting at 1, splits the
/// respondent name out into the PII mapping and drops the phone field
/// entirely.
pub fn pseudonymize(
    responses: &[ParsedResponse],
    fields: &FieldSettings,
) -> (Vec<AnonymizedResponse>, Vec<PiiRecord>) {
    let mut anonymized: Vec<AnonymizedResponse> = Vec::new();
    let mut mapping: Vec<PiiRecord> = Vec::new();

    for (idx, r) in responses.iter().enumerate() {
        let id = (idx + 1) as u32;
        let mut cleaned = r.fields.clone();
        if let Some(name) = cleaned.remove(&fields.name) {
            mapping.push(PiiRecord {
                participant_id: id,
                name,
            });
        }
        cleaned.remove(&fields.phone);
        anonymized.push(AnonymizedResponse {
            id,
            lineno: r.lineno,
            fields: cleaned,
        });
    }
    info!(
        "PII handling done: {:?} responses pseudonymized, name and phone removed",
        anonymized.len()
    );
    (anonymized, mapping)
}

/// Writes the restricted mapping file. Keep this file out of any shared
/// or published location.
pub fn write_pii_mapping(path: &str, records: &[PiiRecord]) -> SurveyResult<()> {
    if records.is_empty() {
        warn!("PII mapping is empty, nothing written to {:?}", path);
        return Ok(());
    }
    let mut wtr = csv::Writer::from_path(path).context(CsvWriteSnafu { path })?;
    wtr.write_record(["participant_id", "nome_completo"])
        .context(CsvWriteSnafu { path })?;
    for r in records.iter() {
        wtr.write_record([r.participant_id.to_string(), r.name.clone()])
            .context(CsvWriteSnafu { path })?;
    }
    wtr.flush().context(FileWriteSnafu { path })?;
    info!("PII mapping written to {:?}. Keep this file secure!", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_settings() -> FieldSettings {
        FieldSettings {
            name: "nome_completo".to_string(),
            phone: "telefone_whatsapp".to_string(),
            scope: "consciencia_escopo".to_string(),
            primary_group: "grupo_principal".to_string(),
            alternate_group: "grupo_alternativo".to_string(),
            intent: "interesse_lideranca".to_string(),
            topic: None,
            sentiment_fields: vec![],
            snippet_field: "bagagem_contribuicao".to_string(),
        }
    }

    fn parsed(lineno: usize, pairs: &[(&str, &str)]) -> ParsedResponse {
        ParsedResponse {
            lineno,
            fields: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn ids_are_sequential_and_pii_fields_are_removed() {
        let responses = vec![
            parsed(
                2,
                &[
                    ("nome_completo", "Alex"),
                    ("telefone_whatsapp", "+55 11 90000-0000"),
                    ("grupo_principal", "G1"),
                ],
            ),
            parsed(3, &[("nome_completo", "Sam"), ("grupo_principal", "G2")]),
        ];
        let (anonymized, mapping) = pseudonymize(&responses, &field_settings());

        assert_eq!(anonymized[0].id, 1);
        assert_eq!(anonymized[1].id, 2);
        assert_eq!(anonymized[0].field("nome_completo"), "");
        assert_eq!(anonymized[0].field("telefone_whatsapp"), "");
        assert_eq!(anonymized[0].field("grupo_principal"), "G1");

        assert_eq!(
            mapping,
            vec![
                PiiRecord {
                    participant_id: 1,
                    name: "Alex".to_string()
                },
                PiiRecord {
                    participant_id: 2,
                    name: "Sam".to_string()
                },
            ]
        );
    }

    #[test]
    fn responses_without_a_name_get_an_id_but_no_mapping_entry() {
        let responses = vec![parsed(2, &[("grupo_principal", "G1")])];
        let (anonymized, mapping) = pseudonymize(&responses, &field_settings());
        assert_eq!(anonymized[0].id, 1);
        assert!(mapping.is_empty());
    }
}
