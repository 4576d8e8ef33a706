//! Field-name translation from the remote éCO2mix API vocabulary to the
//! display column names used by the RTE tab-separated exports.
//!
//! The table is static data. Names absent from it pass through unchanged so
//! that columns added to the dataset in later vintages survive ingestion.

/// Distinguished timestamp key of every canonical record.
pub const DATETIME_COLUMN: &str = "Datetime";

/// Date column of the local upload format.
pub const DATE_COLUMN: &str = "Date";

/// Time column of the local upload format.
pub const TIME_COLUMN: &str = "Heures";

/// Remote field name → canonical column name.
///
/// `date_heure` maps onto the distinguished [`DATETIME_COLUMN`] key.
pub const FIELD_MAP: &[(&str, &str)] = &[
    ("perimetre", "Périmètre"),
    ("nature", "Nature"),
    ("date", DATE_COLUMN),
    ("heure", TIME_COLUMN),
    ("date_heure", DATETIME_COLUMN),
    ("consommation", "Consommation"),
    ("prevision_j1", "Prévision J-1"),
    ("prevision_j", "Prévision J"),
    ("fioul", "Fioul"),
    ("charbon", "Charbon"),
    ("gaz", "Gaz"),
    ("nucleaire", "Nucléaire"),
    ("eolien", "Eolien"),
    ("eolien_terrestre", "Eolien terrestre"),
    ("eolien_offshore", "Eolien offshore"),
    ("solaire", "Solaire"),
    ("hydraulique", "Hydraulique"),
    ("pompage", "Pompage"),
    ("bioenergies", "Bioénergies"),
    ("ech_physiques", "Ech. physiques"),
    ("taux_co2", "Taux de Co2"),
    ("ech_comm_angleterre", "Ech. comm. Angleterre"),
    ("ech_comm_espagne", "Ech. comm. Espagne"),
    ("ech_comm_italie", "Ech. comm. Italie"),
    ("ech_comm_suisse", "Ech. comm. Suisse"),
    ("ech_comm_allemagne_belgique", "Ech. comm. Allemagne-Belgique"),
    ("fioul_tac", "Fioul - TAC"),
    ("fioul_cogen", "Fioul - Cogén."),
    ("fioul_autres", "Fioul - Autres"),
    ("gaz_tac", "Gaz - TAC"),
    ("gaz_cogen", "Gaz - Cogén."),
    ("gaz_ccg", "Gaz - CCG"),
    ("gaz_autres", "Gaz - Autres"),
    // The RTE export writes this header through latin-1, which turns the
    // typographic apostrophe into '?'.
    ("hydraulique_fil_eau_eclusee", "Hydraulique - Fil de l?eau + éclusée"),
    ("hydraulique_lacs", "Hydraulique - Lacs"),
    ("hydraulique_step_turbinage", "Hydraulique - STEP turbinage"),
    ("bioenergies_dechets", "Bioénergies - Déchets"),
    ("bioenergies_biomasse", "Bioénergies - Biomasse"),
    ("bioenergies_biogaz", "Bioénergies - Biogaz"),
    ("stockage_batterie", "Stockage batterie"),
    ("destockage_batterie", "Déstockage batterie"),
];

/// Variables offered for charting by default.
pub const DISPLAY_VARIABLES: &[&str] = &[
    "Consommation",
    "Prévision J-1",
    "Prévision J",
    "Fioul",
    "Charbon",
    "Gaz",
    "Nucléaire",
    "Eolien",
    "Solaire",
    "Hydraulique",
    "Pompage",
    "Bioénergies",
];

/// Translate a remote field name. Unknown names are returned unchanged.
pub fn to_canonical(name: &str) -> &str {
    FIELD_MAP
        .iter()
        .find(|(remote, _)| *remote == name)
        .map(|(_, canonical)| *canonical)
        .unwrap_or(name)
}

/// Whether the remote field name has an entry in [`FIELD_MAP`].
pub fn is_known(name: &str) -> bool {
    FIELD_MAP.iter().any(|(remote, _)| *remote == name)
}
