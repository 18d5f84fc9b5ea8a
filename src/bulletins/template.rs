//! Static per-program template registry.
//!
//! Each academic program and semester maps to one [`TemplateConfig`]: which
//! spreadsheet columns hold grades, how subjects group into teaching units,
//! which credit slots stay hidden, and how the title row binds to document
//! placeholders. The registry also carries the twelve header signatures used
//! to classify an uploaded workbook.

use crate::bulletins::normalize::normalize_string;

/// One teaching unit of a template.
#[derive(Debug)]
pub(crate) struct UnitConfig {
    /// Key for the average and credit placeholders (moyUE1, ECTSUE1).
    pub(crate) avg_key: &'static str,
    /// Key for the state placeholder (etatUE1, etatUESPE).
    pub(crate) state_key: &'static str,
    /// 1-based subject indices of every unit member, hidden ones included.
    pub(crate) members: &'static [usize],
    /// Subset of members whose credits feed the unit sums.
    pub(crate) credit_members: &'static [usize],
}

/// Static layout table for one program and semester shape.
#[derive(Debug)]
pub(crate) struct TemplateConfig {
    pub(crate) key: &'static str,
    /// Key into the external ECTS defaults table.
    pub(crate) ects_key: &'static str,
    /// Number of title cells read from the title row, starting at column 2.
    pub(crate) title_len: usize,
    /// 0-based spreadsheet column of each subject grade cell, subject order.
    pub(crate) grade_columns: &'static [usize],
    pub(crate) units: &'static [UnitConfig],
    /// 1-based subject indices whose credit slot never reaches the document.
    pub(crate) hidden: &'static [usize],
    /// Document template filename under the template directory.
    pub(crate) template_file: &'static str,
    /// Placeholder name to title-slice index.
    pub(crate) title_layout: &'static [(&'static str, usize)],
}

impl TemplateConfig {
    pub(crate) fn is_hidden(&self, subject: usize) -> bool {
        self.hidden.contains(&subject)
    }

    pub(crate) fn subject_count(&self) -> usize {
        self.grade_columns.len()
    }
}

pub(crate) static M1_S1: TemplateConfig = TemplateConfig {
    key: "M1_S1",
    ects_key: "M1-S1",
    title_len: 20,
    grade_columns: &[3, 4, 5, 7, 9, 10, 12, 13, 14, 15, 16, 17, 19, 20, 21],
    units: &[
        UnitConfig {
            avg_key: "UE1",
            state_key: "UE1",
            members: &[1, 2, 3],
            credit_members: &[1, 2, 3],
        },
        UnitConfig {
            avg_key: "UE2",
            state_key: "UE2",
            members: &[4],
            credit_members: &[4],
        },
        UnitConfig {
            avg_key: "UE3",
            state_key: "UE3",
            members: &[5, 6],
            credit_members: &[5, 6],
        },
        UnitConfig {
            avg_key: "UE4",
            state_key: "UE4",
            members: &[7, 8, 9, 10, 11, 12],
            credit_members: &[7, 11],
        },
        UnitConfig {
            avg_key: "UE5",
            state_key: "UESPE",
            members: &[13, 14, 15],
            credit_members: &[13, 14, 15],
        },
    ],
    hidden: &[8, 9, 10, 12],
    template_file: "modeleM1S1.docx",
    title_layout: &[
        ("UE1_Title", 0),
        ("matiere1", 1),
        ("matiere2", 2),
        ("matiere3", 3),
        ("UE2_Title", 4),
        ("matiere4", 5),
        ("UE3_Title", 6),
        ("matiere5", 7),
        ("matiere6", 8),
        ("UE4_Title", 9),
        ("matiere7", 10),
        ("matiere8", 11),
        ("matiere9", 12),
        ("matiere10", 13),
        ("matiere11", 14),
        ("matiere12", 15),
        ("UESPE_Title", 16),
        ("matiere13", 17),
        ("matiere14", 18),
        ("matiere15", 19),
    ],
};

pub(crate) static M1_S2: TemplateConfig = TemplateConfig {
    key: "M1_S2",
    ects_key: "M1-S2",
    title_len: 20,
    grade_columns: &[3, 4, 5, 7, 8, 10, 11, 12, 13, 14, 15, 16, 18, 19, 20, 21],
    units: &[
        UnitConfig {
            avg_key: "UE1",
            state_key: "UE1",
            members: &[1, 2, 3],
            credit_members: &[1, 2, 3],
        },
        UnitConfig {
            avg_key: "UE2",
            state_key: "UE2",
            members: &[4, 5],
            credit_members: &[4, 5],
        },
        UnitConfig {
            avg_key: "UE3",
            state_key: "UE3",
            members: &[6, 7, 8, 9, 10, 11, 12],
            credit_members: &[6, 7, 8, 12],
        },
        UnitConfig {
            avg_key: "UE4",
            state_key: "UESPE",
            members: &[13, 14, 15, 16],
            credit_members: &[13, 14, 15, 16],
        },
    ],
    hidden: &[9, 10, 11],
    template_file: "modeleM1S2.docx",
    title_layout: &[
        ("UE1_Title", 0),
        ("matiere1", 1),
        ("matiere2", 2),
        ("matiere3", 3),
        ("UE2_Title", 4),
        ("matiere4", 5),
        ("matiere5", 6),
        ("UE3_Title", 7),
        ("matiere6", 8),
        ("matiere7", 9),
        ("matiere8", 10),
        ("matiere9", 11),
        ("matiere10", 12),
        ("matiere11", 13),
        ("matiere12", 14),
        ("UESPE_Title", 15),
        ("matiere13", 16),
        ("matiere14", 17),
        ("matiere15", 18),
        ("matiere16", 19),
    ],
};

const M2_S3_GRADE_COLUMNS: &[usize] = &[3, 4, 6, 8, 9, 10, 11, 12, 13, 15, 16, 17, 18];

const M2_S3_TITLE_LAYOUT: &[(&str, usize)] = &[
    ("UE1_Title", 0),
    ("matiere1", 1),
    ("matiere2", 2),
    ("UE2_Title", 3),
    ("matiere3", 4),
    ("UE3_Title", 5),
    ("matiere4", 6),
    ("matiere5", 7),
    ("matiere6", 8),
    ("matiere7", 9),
    ("matiere8", 10),
    ("matiere9", 11),
    ("UESPE_Title", 12),
    ("matiere10", 13),
    ("matiere11", 14),
    ("matiere12", 15),
    ("matiere13", 16),
];

pub(crate) static M2_S3_MAGI: TemplateConfig = TemplateConfig {
    key: "M2_S3_MAGI",
    ects_key: "M2-S3-MAGI",
    title_len: 17,
    grade_columns: M2_S3_GRADE_COLUMNS,
    units: &[
        UnitConfig {
            avg_key: "UE1",
            state_key: "UE1",
            members: &[1, 2],
            credit_members: &[1, 2],
        },
        UnitConfig {
            avg_key: "UE2",
            state_key: "UE2",
            members: &[3],
            credit_members: &[3],
        },
        UnitConfig {
            avg_key: "UE3",
            state_key: "UE3",
            members: &[4, 5, 6, 7, 8, 9],
            credit_members: &[4, 5, 6, 7, 8, 9],
        },
        UnitConfig {
            avg_key: "UE4",
            state_key: "UESPE",
            members: &[10, 11, 12, 13],
            credit_members: &[10, 11, 12, 13],
        },
    ],
    hidden: &[4, 8, 9],
    template_file: "modeleM2S3.docx",
    title_layout: M2_S3_TITLE_LAYOUT,
};

pub(crate) static M2_S3_MEFIM: TemplateConfig = TemplateConfig {
    key: "M2_S3_MEFIM",
    ects_key: "M2-S3-MEFIM",
    title_len: 17,
    grade_columns: M2_S3_GRADE_COLUMNS,
    units: &[
        UnitConfig {
            avg_key: "UE1",
            state_key: "UE1",
            members: &[1, 2],
            credit_members: &[1, 2],
        },
        UnitConfig {
            avg_key: "UE2",
            state_key: "UE2",
            members: &[3],
            credit_members: &[3],
        },
        UnitConfig {
            avg_key: "UE3",
            state_key: "UE3",
            members: &[4, 5, 6, 7, 8, 9],
            credit_members: &[4, 5, 6, 7, 8, 9],
        },
        UnitConfig {
            avg_key: "UE4",
            state_key: "UESPE",
            members: &[10, 11, 12, 13],
            credit_members: &[10, 11, 12, 13],
        },
    ],
    hidden: &[4, 8, 9],
    template_file: "modeleM2S3.docx",
    title_layout: M2_S3_TITLE_LAYOUT,
};

pub(crate) static M2_S3_MAPI: TemplateConfig = TemplateConfig {
    key: "M2_S3_MAPI",
    ects_key: "M2-S3-MAPI",
    title_len: 18,
    grade_columns: &[3, 4, 6, 8, 9, 10, 11, 12, 13, 15, 16, 17, 18, 19],
    units: &[
        UnitConfig {
            avg_key: "UE1",
            state_key: "UE1",
            members: &[1, 2],
            credit_members: &[1, 2],
        },
        UnitConfig {
            avg_key: "UE2",
            state_key: "UE2",
            members: &[3],
            credit_members: &[3],
        },
        UnitConfig {
            avg_key: "UE3",
            state_key: "UE3",
            members: &[4, 5, 6, 7, 8, 9],
            credit_members: &[4, 5, 6, 7, 8, 9],
        },
        UnitConfig {
            avg_key: "UE4",
            state_key: "UESPE",
            members: &[10, 11, 12, 13, 14],
            credit_members: &[10, 11, 12, 13, 14],
        },
    ],
    hidden: &[4, 8, 9],
    template_file: "modeleM2S3MAPI.docx",
    title_layout: &[
        ("UE1_Title", 0),
        ("matiere1", 1),
        ("matiere2", 2),
        ("UE2_Title", 3),
        ("matiere3", 4),
        ("UE3_Title", 5),
        ("matiere4", 6),
        ("matiere5", 7),
        ("matiere6", 8),
        ("matiere7", 9),
        ("matiere8", 10),
        ("matiere9", 11),
        ("UESPE_Title", 12),
        ("matiere10", 13),
        ("matiere11", 14),
        ("matiere12", 15),
        ("matiere13", 16),
        ("matiere14", 17),
    ],
};

pub(crate) static M2_S4: TemplateConfig = TemplateConfig {
    key: "M2_S4",
    ects_key: "M2-S4",
    title_len: 15,
    grade_columns: &[3, 5, 6, 8, 9, 10, 11, 12, 14, 15, 16],
    units: &[
        UnitConfig {
            avg_key: "UE1",
            state_key: "UE1",
            members: &[1],
            credit_members: &[1],
        },
        UnitConfig {
            avg_key: "UE2",
            state_key: "UE2",
            members: &[2, 3],
            credit_members: &[2, 3],
        },
        UnitConfig {
            avg_key: "UE3",
            state_key: "UE3",
            members: &[4, 5, 6, 7, 8],
            credit_members: &[4, 5, 8],
        },
        UnitConfig {
            avg_key: "UE4",
            state_key: "UESPE",
            members: &[9, 10, 11],
            credit_members: &[9, 10, 11],
        },
    ],
    hidden: &[6, 7],
    template_file: "modeleM2S4.docx",
    title_layout: &[
        ("UE1_Title", 0),
        ("matiere1", 1),
        ("UE2_Title", 2),
        ("matiere2", 3),
        ("matiere3", 4),
        ("UE3_Title", 5),
        ("matiere4", 6),
        ("matiere5", 7),
        ("matiere6", 8),
        ("matiere7", 9),
        ("matiere8", 10),
        ("UESPE_Title", 11),
        ("matiere9", 12),
        ("matiere10", 13),
        ("matiere11", 14),
    ],
};

/// One header signature of the classification registry.
pub(crate) struct TemplateSignature {
    pub(crate) name: &'static str,
    pub(crate) headers: &'static [&'static str],
    pub(crate) config: &'static TemplateConfig,
}

/// Ordered classification registry. Order matters: the first signature whose
/// headers prefix-match the uploaded title cells wins.
pub(crate) static SIGNATURES: &[TemplateSignature] = &[
    TemplateSignature {
        name: "MAPI",
        headers: &[
            "UE 1 – Economie & Gestion",
            "Stratégie et Solutions Immobilières",
            "Finance Immobilière",
            "Economie Immobilière I",
            "UE 2 – Droit",
            "Droit des Affaires et des Contrats",
            "UE 3 – Aménagement & Urbanisme",
            "Ville et Développements Urbains",
            "Politique de l'Habitat",
            "UE 4 – Compétences Professionnalisantes",
            "Real Estate English",
            "Rencontres de l'Immobilier",
            "ESPI Career Services",
            "ESPI Inside",
            "Immersion Professionnelle",
            "Projet Voltaire",
            "UE SPE – MAPI",
            "Etude Foncière",
            "Montage d'une Opération de Promotion Immobilière",
            "Acquisition et Dissociation du Foncier",
        ],
        config: &M1_S1,
    },
    TemplateSignature {
        name: "MAGI",
        headers: &[
            "UE 1 – Economie & Gestion",
            "Stratégie et Solutions Immobilières",
            "Finance Immobilière",
            "Economie Immobilière I",
            "UE 2 – Droit",
            "Droit des Affaires et des Contrats",
            "UE 3 – Aménagement & Urbanisme",
            "Ville et Développements Urbains",
            "Politique de l'Habitat",
            "UE 4 – Compétences Professionnalisantes",
            "Real Estate English",
            "Rencontres de l'Immobilier",
            "ESPI Career Services",
            "ESPI Inside",
            "Immersion Professionnelle",
            "Projet Voltaire",
            "UE SPE – MAGI",
            "Baux Commerciaux et Gestion Locative",
            "Actifs Tertiaires en Copropriété",
            "Techniques du Bâtiment",
        ],
        config: &M1_S1,
    },
    TemplateSignature {
        name: "MEFIM",
        headers: &[
            "UE 1 – Economie & Gestion",
            "Stratégie et Solutions Immobilières",
            "Finance Immobilière",
            "Economie Immobilière I",
            "UE 2 – Droit",
            "Droit des Affaires et des Contrats",
            "UE 3 – Aménagement & Urbanisme",
            "Ville et Développements Urbains",
            "Politique de l'Habitat",
            "UE 4 – Compétences Professionnalisantes",
            "Real Estate English",
            "Rencontres de l'Immobilier",
            "ESPI Career Services",
            "ESPI Inside",
            "Immersion Professionnelle",
            "Projet Voltaire",
            "UE SPE – MEFIM",
            "Les Fondamentaux de l'Evaluation",
            "Analyse et Financement Immobilier",
            "Modélisation Financière",
        ],
        config: &M1_S1,
    },
    TemplateSignature {
        name: "MAPI_S2",
        headers: &[
            "UE 1 – Economie & Gestion",
            "Marketing de l'Immobilier",
            "Investissement et Financiarisation",
            "Fiscalité",
            "UE 2 – Droit",
            "Droit de l'Urbanisme et de la Construction",
            "Déontologie en France et à l'International",
            "UE 4 – Compétences Professionnalisantes",
            "Immersion Professionnelle",
            "Real Estate English",
            "Atelier Méthodologie de la Recherche",
            "Techniques de Négociation",
            "Rencontres de l'Immobilier",
            "ESPI Inside",
            "Projet Voltaire",
            "UE SPE – MAPI",
            "Droit de la Promotion Immobilière",
            "Montage d'une Opération de Logement",
            "Financement des Opérations de Promotion Immobilière",
            "Logement Social et Accession Sociale",
        ],
        config: &M1_S2,
    },
    TemplateSignature {
        name: "MAGI_S2",
        headers: &[
            "UE 1 – Economie & Gestion",
            "Marketing de l'Immobilier",
            "Investissement et Financiarisation",
            "Fiscalité",
            "UE 2 – Droit",
            "Droit de l'Urbanisme et de la Construction",
            "Déontologie en France et à l'International",
            "UE 4 – Compétences Professionnalisantes",
            "Immersion Professionnelle",
            "Real Estate English",
            "Atelier Méthodologie de la Recherche",
            "Techniques de Négociation",
            "Rencontres de l'Immobilier",
            "ESPI Inside",
            "Projet Voltaire",
            "UE SPE – MAGI",
            "Budget d'Exploitation et de Travaux",
            "Développement et Stratégie Commerciale",
            "Technique et Conformité des Immeubles",
            "Gestion de l'Immobilier - Logistique et Data Center",
        ],
        config: &M1_S2,
    },
    TemplateSignature {
        name: "MEFIM_S2",
        headers: &[
            "UE 1 – Economie & Gestion",
            "Marketing de l'Immobilier",
            "Investissement et Financiarisation",
            "Fiscalité",
            "UE 2 – Droit",
            "Droit de l'Urbanisme et de la Construction",
            "Déontologie en France et à l'International",
            "UE 4 – Compétences Professionnalisantes",
            "Immersion Professionnelle",
            "Real Estate English",
            "Atelier Méthodologie de la Recherche",
            "Techniques de Négociation",
            "Rencontres de l'Immobilier",
            "ESPI Inside",
            "Projet Voltaire",
            "UE SPE – MEFIM",
            "Marché d'Actifs Immobiliers",
            "Baux Commerciaux",
            "Evaluation des Actifs Résidentiels",
            "Audit et Gestion des Immeubles",
        ],
        config: &M1_S2,
    },
    TemplateSignature {
        name: "MAPI_S3",
        headers: &[
            "UE 1 – Economie & Gestion",
            "PropTech et Innovation",
            "Economie Immobilière II",
            "UE 3 – Aménagement & Urbanisme",
            "Stratégies et Aménagement des Territoires I",
            "UE 4 – Compétences Professionnalisantes",
            "Communication Digitale, Ecrite et Orale",
            "Immersion Professionnelle",
            "Real Estate English",
            "Méthodologie de la Recherche",
            "Rencontres de l'Immobilier",
            "ESPI Inside",
            "UE SPE – MAPI",
            "Acquisition et Dissociation du Foncier",
            "Montage des Opérations Tertiaires",
            "Aménagement et Commande Publique",
            "Techniques du Bâtiment",
            "Réhabilitation et Pathologies du Bâtiment",
        ],
        config: &M2_S3_MAPI,
    },
    TemplateSignature {
        name: "MAGI_S3",
        headers: &[
            "UE 1 – Economie & Gestion",
            "PropTech et Innovation",
            "Economie Immobilière II",
            "UE 3 – Aménagement & Urbanisme",
            "Stratégies et Aménagement des Territoires I",
            "UE 4 – Compétences Professionnalisantes",
            "Communication Digitale, Ecrite et Orale",
            "Immersion Professionnelle",
            "Real Estate English",
            "Méthodologie de la Recherche",
            "Rencontres de l'Immobilier",
            "ESPI Inside",
            "UE SPE – MAGI",
            "Rénovation Energétique des Actifs Tertiaires",
            "Arbitrage, Optimisation et Valorisation des Actifs Tertiaires",
            "Maintenance et Facility Management",
            "Réhabilitation et Pathologies du Bâtiment",
        ],
        config: &M2_S3_MAGI,
    },
    TemplateSignature {
        name: "MEFIM_S3",
        headers: &[
            "UE 1 – Economie & Gestion",
            "PropTech et Innovation",
            "Economie Immobilière II",
            "UE 3 – Aménagement & Urbanisme",
            "Stratégies et Aménagement des Territoires I",
            "UE 4 – Compétences Professionnalisantes",
            "Communication Digitale, Ecrite et Orale",
            "Immersion Professionnelle",
            "Real Estate English",
            "Méthodologie de la Recherche",
            "Rencontres de l'Immobilier",
            "ESPI Inside",
            "UE SPE – MEFIM",
            "Droit des Suretés et de la Transmission",
            "Due Diligence",
            "Evaluation d'Actifs Tertiaires et Industriels",
            "Gestion de Patrimoine",
        ],
        config: &M2_S3_MEFIM,
    },
    TemplateSignature {
        name: "MAPI_S4",
        headers: &[
            "UE 1 – Economie & Gestion",
            "Economie de l'Environnement",
            "UE 3 – Aménagement & Urbanisme",
            "Normalisation, Labellisation",
            "Stratégies et Aménagement des Territoires II",
            "UE 4 – Compétences Professionnalisantes",
            "Real Estate English",
            "Mémoire de Recherche",
            "Rencontres de l'Immobilier",
            "ESPI Career Services",
            "Immersion Professionnelle",
            "UE SPE – MAPI",
            "Business Game Aménagement et Promotion Immobilière",
            "Fiscalité et Promotion Immobilière",
            "Contentieux de l'Urbanisme",
        ],
        config: &M2_S4,
    },
    TemplateSignature {
        name: "MAGI_S4",
        headers: &[
            "UE 1 – Economie & Gestion",
            "Economie de l'Environnement",
            "UE 3 – Aménagement & Urbanisme",
            "Normalisation, Labellisation",
            "Stratégies et Aménagement des Territoires II",
            "UE 4 – Compétences Professionnalisantes",
            "Real Estate English",
            "Mémoire de Recherche",
            "Rencontres de l'Immobilier",
            "ESPI Career Services",
            "Immersion Professionnelle",
            "UE SPE – MAGI",
            "Business Game Property Management",
            "Gestion des Centres Commerciaux",
            "Gestion de Contentieux et Recouvrement",
        ],
        config: &M2_S4,
    },
    TemplateSignature {
        name: "MEFIM_S4",
        headers: &[
            "UE 1 – Economie & Gestion",
            "Economie de l'Environnement",
            "UE 3 – Aménagement & Urbanisme",
            "Normalisation, Labellisation",
            "Stratégies et Aménagement des Territoires II",
            "UE 4 – Compétences Professionnalisantes",
            "Real Estate English",
            "Mémoire de Recherche",
            "Rencontres de l'Immobilier",
            "ESPI Career Services",
            "Immersion Professionnelle",
            "UE SPE – MEFIM",
            "Business Game Arbitrage et Stratégies d'Investissement",
            "Fiscalité du Patrimoine",
            "Fintech et Blockchain",
        ],
        config: &M2_S4,
    },
];

/// Classify an uploaded workbook from its non-empty title cells.
///
/// Comparison is a prefix match on accent-stripped, case-folded text; the
/// first matching registry entry wins. Returns `None` when nothing matches.
pub(crate) fn classify(title_cells: &[String]) -> Option<&'static TemplateSignature> {
    let normalized: Vec<String> = title_cells
        .iter()
        .filter(|cell| !cell.trim().is_empty())
        .map(|cell| normalize_string(cell))
        .collect();

    SIGNATURES.iter().find(|signature| {
        normalized.len() >= signature.headers.len()
            && signature
                .headers
                .iter()
                .zip(&normalized)
                .all(|(expected, actual)| normalize_string(expected) == *actual)
    })
}
