//! Instruction prefixes for summary generation.
//!
//! Wording must stay identical to the instructions the summarisation models
//! were fine-tuned on, typos included.

use serde::{Deserialize, Serialize};

/// Bullet count used when a bullet summary does not name one.
pub const DEFAULT_BULLET_POINTS: u32 = 3;

/// Requested summary length. Unknown categories mean in-depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum SummaryCategory {
    UltraConcise,
    Concise,
    Short,
    Medium,
    Long,
    #[default]
    InDepth,
}

impl From<String> for SummaryCategory {
    fn from(value: String) -> Self {
        match value.as_str() {
            "ultra_concise" => SummaryCategory::UltraConcise,
            "concise" => SummaryCategory::Concise,
            "short" => SummaryCategory::Short,
            "medium" => SummaryCategory::Medium,
            "long" => SummaryCategory::Long,
            _ => SummaryCategory::InDepth,
        }
    }
}

pub fn instruction_prefix(
    is_bullet: bool,
    category: SummaryCategory,
    num_bullet_points: Option<u32>,
) -> String {
    if is_bullet {
        let n = num_bullet_points.unwrap_or(DEFAULT_BULLET_POINTS);
        match category {
            SummaryCategory::UltraConcise => format!(
                "Naredi {n} kraih alinej iz besedila. Naj bodo izjemno kratke in jedrnate."
            ),
            SummaryCategory::Concise => {
                format!("Pretvori besedilo v {n} alinej. Naj bodo kratke in jasne.")
            }
            SummaryCategory::Short => {
                format!("Ustvari {n} alinej iz besedila, z nekoliko več podrobnosti.")
            }
            SummaryCategory::Medium => {
                format!("Naredi {n} alinej iz besedila z zmerno količino podrobnosti.")
            }
            SummaryCategory::Long => format!(
                "Razčleni besedilo v {n} alinej z več podrobnostmi in razširjenimi pojasnili."
            ),
            SummaryCategory::InDepth => format!(
                "Razvij {n} alinej iz besedila, pri čemer vključuješ poglobljene informacije in podrobne razlage."
            ),
        }
    } else {
        match category {
            SummaryCategory::UltraConcise => {
                "Zgoščeno povzemite glavno idejo v eni sami, osrednji misli. Povzetek naj bo čim krajši."
            }
            SummaryCategory::Concise => {
                "Strnite bistvo v kratke in jedrnate povedi, izpostavljajoč najpomembnejše informacije."
            }
            SummaryCategory::Short => {
                "Napišite kratek povzetek, ki zajame ključne točke in poudari pomembne informacije."
            }
            SummaryCategory::Medium => {
                "Oblikujte povzetek, ki vključuje pomembne podrobnosti in argumente."
            }
            SummaryCategory::Long => {
                "Pripravite obširen povzetek, ki pokriva vse ključne vidike in informacije."
            }
            SummaryCategory::InDepth => {
                "Ustvarite temeljit povzetek, ki podrobno povzema vse glavne točke, podatke in zaključke."
            }
        }
        .to_string()
    }
}
