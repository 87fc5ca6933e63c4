use serde::{Deserialize, Serialize};

/// One row of the medication reference table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicationRecord {
    pub name: String,
    pub description: String,
    pub usage: String,
    pub indications: String,
}

/// Read-only source of medication reference data. Kept behind a trait so the
/// built-in table can be swapped for a real dataset without touching the
/// query logic.
pub trait MedicationSource: Send + Sync {
    /// Case-insensitive substring filter over name and indications. An empty
    /// search term returns every row in stored order. This is a filter, not
    /// a ranked search.
    fn search(&self, term: &str) -> Vec<MedicationRecord>;
}

/// Fixed in-memory medication table.
pub struct StaticFormulary {
    records: Vec<MedicationRecord>,
}

impl StaticFormulary {
    pub fn new(records: Vec<MedicationRecord>) -> Self {
        Self { records }
    }

    /// The built-in reference table of common medications.
    pub fn builtin() -> Self {
        fn record(name: &str, description: &str, usage: &str, indications: &str) -> MedicationRecord {
            MedicationRecord {
                name: name.to_string(),
                description: description.to_string(),
                usage: usage.to_string(),
                indications: indications.to_string(),
            }
        }

        Self::new(vec![
            record(
                "Paracetamol",
                "Analgésico e antitérmico para dor e febre",
                "Tomar 1 comprimido de 500mg a cada 6 horas, máximo 4g/dia",
                "Dores leves a moderadas, febre",
            ),
            record(
                "Ibuprofeno",
                "Anti-inflamatório para dores e inflamações",
                "Tomar 1 comprimido de 400mg a cada 8 horas com alimentos",
                "Dores musculares, inflamações, cólicas",
            ),
            record(
                "Omeprazol",
                "Protetor gástrico para azia e gastrite",
                "Tomar 1 cápsula de 20mg pela manhã em jejum",
                "Azia, gastrite, refluxo",
            ),
            record(
                "Amoxicilina",
                "Antibiótico para infecções bacterianas",
                "Tomar conforme prescrição médica (geralmente a cada 8 ou 12 horas)",
                "Infecções bacterianas (ouvido, garganta, etc.)",
            ),
            record(
                "Dipirona",
                "Analgésico e antitérmico para dores moderadas",
                "Tomar 1 comprimido de 500mg a cada 6 horas se necessário",
                "Dores moderadas, febre",
            ),
        ])
    }
}

impl MedicationSource for StaticFormulary {
    fn search(&self, term: &str) -> Vec<MedicationRecord> {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return self.records.clone();
        }

        self.records
            .iter()
            .filter(|record| {
                record.name.to_lowercase().contains(&needle)
                    || record.indications.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect()
    }
}
