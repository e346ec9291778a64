use crate::catalog::Catalog;
use crate::palette::DEFAULT_SEED;
use crate::region::{RegionComposer, RegionMap};
use crate::statics;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable naming a config file when none is given on the command line.
pub const CONFIG_ENV_VAR: &str = "DEMEX_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing config {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Explorer settings. Every field has a default, so a config file only lists overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    pub seed: u64,
    pub min_class: u32,
    pub default_country: String,
    pub panel_sources: Vec<PathBuf>,
    pub metadata_sources: Vec<PathBuf>,
    pub class_labels: IndexMap<String, String>,
    pub group_labels: IndexMap<String, String>,
    pub regions: RegionMap,
    pub excluded_suffixes: Vec<String>,
    pub preferred_variables: Vec<String>,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            min_class: 2,
            default_country: statics::DEFAULT_COUNTRY.to_string(),
            panel_sources: vec![
                PathBuf::from("data").join("vdem_all.csv.gz"),
                PathBuf::from("data").join("vdem_all.csv"),
            ],
            metadata_sources: vec![
                PathBuf::from("data").join("indicadores_vdem.csv"),
                PathBuf::from("data").join("indicadores_vdem.json5"),
            ],
            class_labels: to_map(BUILTIN_CLASS_LABELS),
            group_labels: to_map(BUILTIN_GROUP_LABELS),
            regions: BUILTIN_REGIONS
                .iter()
                .map(|(tag, members)| {
                    (
                        tag.to_string(),
                        members.iter().map(|c| c.to_string()).collect(),
                    )
                })
                .collect(),
            excluded_suffixes: statics::AUX_COLUMN_SUFFIXES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            preferred_variables: statics::PREFERRED_VARIABLES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl ExplorerConfig {
    /// Parse a JSON5 config file. Relative data sources resolve against the file's directory.
    pub fn load_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::parse_json5(&text).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        if let Some(base) = path.parent() {
            config.rebase_sources(base);
        }
        Ok(config)
    }

    pub fn parse_json5(text: &str) -> Result<Self, json5::Error> {
        let config: Self = json5::from_str(text)?;
        Ok(config.normalized())
    }

    /// Config from an explicit path, else from `DEMEX_CONFIG`, else the built-in defaults.
    pub fn discover(cli_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let path = cli_path.or_else(|| std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from));
        match path {
            Some(path) => Self::load_path(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn labels(&self) -> CatalogLabels {
        CatalogLabels {
            classes: self.class_labels.clone(),
            groups: self.group_labels.clone(),
        }
    }

    pub fn region_composer(&self) -> RegionComposer {
        RegionComposer::new(self.regions.clone())
    }

    fn normalized(mut self) -> Self {
        let regions = std::mem::take(&mut self.regions);
        self.regions = RegionMap::new(regions.into_inner());
        self
    }

    fn rebase_sources(&mut self, base: &Path) {
        for source in self
            .panel_sources
            .iter_mut()
            .chain(self.metadata_sources.iter_mut())
        {
            if source.is_relative() {
                *source = base.join(&*source);
            }
        }
    }
}

fn to_map(entries: &[(&str, &str)]) -> IndexMap<String, String> {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Display labels for class and group ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogLabels {
    pub classes: IndexMap<String, String>,
    pub groups: IndexMap<String, String>,
}

impl CatalogLabels {
    /// `"{id} - {label}"`, falling back to the metadata header title, then a placeholder.
    pub fn class_display(&self, catalog: &Catalog, class_id: &str) -> String {
        let label = self
            .classes
            .get(class_id)
            .cloned()
            .or_else(|| header_title(catalog, class_id))
            .unwrap_or_else(|| statics::EN_UNKNOWN_CLASS.to_string());
        format!("{class_id} - {label}")
    }

    pub fn group_display(&self, catalog: &Catalog, group_id: &str) -> String {
        let label = self
            .groups
            .get(group_id)
            .cloned()
            .or_else(|| header_title(catalog, group_id))
            .unwrap_or_else(|| statics::EN_UNNAMED_GROUP.to_string());
        format!("{group_id} - {label}")
    }
}

fn header_title(catalog: &Catalog, id: &str) -> Option<String> {
    catalog
        .header(id)
        .map(|h| h.titulo.clone())
        .filter(|t| !t.is_empty())
}

const BUILTIN_CLASS_LABELS: &[(&str, &str)] = &[
    ("1", "Identificadores"),
    ("2", "Índices de Democracia do V-Dem"),
    ("3", "Indicadores V-Dem"),
    ("4", "V-Dem Histórico"),
    ("5", "Outros Índices Criados pelo V-Dem"),
    ("6", "Sistemas Partidários"),
    ("7", "Digital Society Survey"),
    ("8", "Variedades de Doutrinação"),
    ("9", "Outros Índices e Indicadores de Democracia"),
    ("10", "Fatores de Contexto (E)"),
];

const BUILTIN_GROUP_LABELS: &[(&str, &str)] = &[
    ("2.1", "Índices de Democracia Agregados (High-Level)"),
    ("2.2", "Componentes de Democracia (Mid-Level)"),
    ("3.1", "Eleições"),
    ("3.2", "Partidos Políticos"),
    ("3.3", "Democracia Direta"),
    ("3.4", "Poder Executivo"),
    ("3.5", "Poder Legislativo"),
    ("3.6", "Deliberação"),
    ("3.7", "Judiciário"),
    ("3.8", "Liberdades Civis"),
    ("3.9", "Soberania/Estado"),
    ("3.10", "Sociedade Civil"),
    ("3.11", "Mídia"),
    ("3.12", "Igualdade Política"),
    ("3.13", "Exclusão"),
    ("3.14", "Legitimação"),
    ("3.15", "Espaço Cívico e Acadêmico"),
    ("4.1", "Eleições (Hist.)"),
    ("4.2", "Partidos Políticos (Hist.)"),
    ("4.3", "Poder Legislativo (Hist.)"),
    ("4.4", "Judiciário (Hist.)"),
    ("4.5", "Liberdades Civis (Hist.)"),
    ("4.6", "Soberania/Estado (Hist.)"),
    ("4.7", "Igualdade Política (Hist.)"),
    ("4.8", "V-Dem Histórico Modificado"),
    ("4.9", "Sobreposições/Discrepâncias (Hist.)"),
    ("5.1", "Regimes do Mundo (RoW)"),
    ("5.2", "Accountability"),
    ("5.3", "Bases de Poder do Executivo"),
    ("5.4", "Neopatrimonialismo"),
    ("5.5", "Liberdades Civis"),
    ("5.6", "Exclusão"),
    ("5.7", "Corrupção"),
    ("5.8", "Empoderamento das Mulheres"),
    ("5.9", "Estado de Direito"),
    ("5.10", "Democracia Direta"),
    ("5.11", "Sociedade Civil"),
    ("5.12", "Eleições"),
    ("5.13", "Institucionalização Partidária"),
    ("5.14", "Dimensões de Democracia Consensual"),
    ("5.15", "Liberdade Acadêmica"),
    ("6.1", "Índices de Democracia do Sistema Partidário"),
    ("6.2", "Democracia da Coalizão de Governo"),
    ("6.3", "Democracia dos Partidos de Oposição"),
    ("6.4", "Religião do Sistema Partidário"),
    ("6.5", "Religião da Coalizão de Governo"),
    ("6.6", "Religião dos Partidos de Oposição"),
    ("6.7", "Exclusão no Sistema Partidário"),
    ("6.8", "Exclusão - Coalizão de Governo"),
    ("6.9", "Exclusão - Oposição"),
    ("6.10", "Esquerda–Direita do Sistema Partidário"),
    ("6.11", "Esquerda–Direita - Governo"),
    ("6.12", "Esquerda–Direita - Oposição"),
    ("7.1", "Operações Coordenadas de Informação"),
    ("7.2", "Liberdade de Mídia Digital"),
    ("7.3", "Capacidade e Abordagem Estatal de Regulação Online"),
    ("7.4", "Polarização na Mídia Online"),
    ("7.5", "Clivagens Sociais"),
    ("8.1", "Índices de Doutrinação"),
    ("8.2", "Currículo Geral"),
    ("8.3", "Currículo por Disciplinas"),
    ("8.4", "Professores"),
    ("8.5", "Escolas"),
    ("8.6", "Mídia (Doutrinação)"),
    ("9.1", "Versões Ordinais de Índices"),
    ("9.2", "Regimes Políticos"),
    ("9.3", "Freedom House"),
    ("9.4", "World Bank Governance Indicators"),
    ("9.5", "Índice Lexical de Democracia Eleitoral"),
    ("9.6", "Unified Democracy Score"),
    ("9.7", "Instituições/ Eventos Políticos"),
    ("9.8", "Polity5"),
    ("9.9", "Outros"),
    ("10.1", "Educação (E)"),
    ("10.2", "Geografia (E)"),
    ("10.3", "Economia (E)"),
    ("10.4", "Riqueza de Recursos Naturais (E)"),
    ("10.5", "Infraestrutura (E)"),
    ("10.6", "Demografia (E)"),
    ("10.7", "Conflito (E)"),
];

const BUILTIN_REGIONS: &[(&str, &[&str])] = &[
    ("None", &[]),
    (
        "America do Norte & Caribe",
        &[
            "United States of America", "Canada", "Mexico", "Bahamas", "Barbados", "Cuba",
            "Dominican Republic", "Haiti", "Jamaica", "Trinidad and Tobago", "Antigua and Barbuda",
            "Dominica", "Grenada", "Saint Kitts and Nevis", "Saint Lucia",
            "Saint Vincent and the Grenadines",
        ],
    ),
    (
        "America Latina",
        &[
            "Mexico", "Belize", "Costa Rica", "El Salvador", "Guatemala", "Honduras", "Nicaragua",
            "Panama", "Argentina", "Bolivia", "Brazil", "Chile", "Colombia", "Ecuador", "Guyana",
            "Paraguay", "Peru", "Suriname", "Uruguay", "Venezuela",
        ],
    ),
    (
        "América do Sul",
        &[
            "Argentina", "Bolivia", "Brazil", "Chile", "Colombia", "Ecuador", "Guyana", "Paraguay",
            "Peru", "Suriname", "Uruguay", "Venezuela",
        ],
    ),
    (
        "Oeste Europeu",
        &[
            "Austria", "Belgium", "Denmark", "Finland", "France", "Germany", "Ireland", "Italy",
            "Luxembourg", "Netherlands", "Norway", "Portugal", "Spain", "Sweden", "Switzerland",
            "United Kingdom",
        ],
    ),
    (
        "Zona do Euro",
        &[
            "Austria", "Belgium", "Cyprus", "Estonia", "Finland", "France", "Germany", "Greece",
            "Ireland", "Italy", "Latvia", "Lithuania", "Luxembourg", "Malta", "Netherlands",
            "Portugal", "Slovakia", "Slovenia", "Spain",
        ],
    ),
    (
        "Leste Europeu",
        &[
            "Albania", "Bosnia and Herzegovina", "Bulgaria", "Croatia", "Czech Republic", "Hungary",
            "Slovakia", "Slovenia", "Kosovo", "Montenegro", "North Macedonia", "Poland", "Romania", "Serbia",
            "Belarus", "Moldova", "Ukraine", "Russia", "Latvia", "Lithuania", "Malta", "Cyprus",
            "Estonia",
        ],
    ),
    (
        "Ásia (Centro-Sul)",
        &[
            "Afghanistan", "Armenia", "Azerbaijan", "Bangladesh", "Bhutan", "Georgia", "India",
            "Kazakhstan", "Kyrgyzstan", "Maldives", "Nepal", "Pakistan", "Sri Lanka", "Tajikistan",
            "Turkmenistan", "Uzbekistan", "Laos", "Thailand", "Cambodia",
        ],
    ),
    (
        "Ásia (norte-Leste)",
        &[
            "China", "Japan", "Mongolia", "North Korea", "South Korea", "Taiwan", "Russia",
        ],
    ),
    (
        "Ásia",
        &[
            "Afghanistan", "Armenia", "Azerbaijan", "Bahrain", "Bangladesh", "Bhutan", "Brunei",
            "Cambodia", "China", "Georgia", "India", "Japan", "Kazakhstan", "Kuwait", "Kyrgyzstan",
            "Laos", "Lebanon", "Maldives", "Mongolia", "Myanmar", "Nepal", "North Korea",
            "Pakistan", "Qatar", "Singapore", "South Korea", "Thailand", "Sri Lanka", "Tajikistan",
            "Timor-Leste", "Turkmenistan", "Uzbekistan", "Vietnam", "Russia",
        ],
    ),
    (
        "Oriente Médio",
        &[
            "Bahrain", "Cyprus", "Egypt", "Iran", "Iraq", "Israel", "Jordan", "Kuwait", "Lebanon",
            "Oman", "Palestine", "Qatar", "Saudi Arabia", "Syria", "Turkey", "United Arab Emirates",
            "Yemen",
        ],
    ),
    (
        "África",
        &[
            "Algeria", "Angola", "Benin", "Botswana", "Burkina Faso", "Burundi", "Cabo Verde",
            "Cameroon", "Central African Republic", "Chad", "Comoros", "Congo",
            "Democratic Republic of the Congo", "Djibouti", "Egypt", "Equatorial Guinea", "Eritrea",
            "Eswatini", "Ethiopia", "Gabon", "Gambia", "Ghana", "Guinea", "Guinea-Bissau",
            "Ivory Coast", "Kenya", "Lesotho", "Liberia", "Libya", "Madagascar", "Malawi", "Mali",
            "Mauritania", "Mauritius", "Morocco", "Mozambique", "Namibia", "Niger", "Nigeria",
            "Rwanda", "São Tomé and Príncipe", "Senegal", "Seychelles", "Sierra Leone", "Somalia",
            "South Africa", "South Sudan", "Sudan", "Tanzania", "Togo", "Tunisia", "Uganda",
            "Zambia", "Zimbabwe",
        ],
    ),
    (
        "Oceania & Pacífico",
        &[
            "Australia", "New Zealand", "Fiji", "Kiribati", "Marshall Islands", "Micronesia",
            "Nauru", "Palau", "Papua New Guinea", "Samoa", "Solomon Islands", "Tonga", "Tuvalu",
            "Vanuatu", "Malaysia", "Philippines", "Indonesia",
        ],
    ),
    (
        "Conselho de Segurança (ONU)",
        &[
            "United States", "United Kingdom", "France", "Russia", "China",
        ],
    ),
    (
        "G7",
        &[
            "United States", "United Kingdom", "France", "Germany", "Italy", "Canada", "Japan",
        ],
    ),
    (
        "G20",
        &[
            "Argentina", "Australia", "Brazil", "Canada", "China", "France", "Germany", "India",
            "Indonesia", "Italy", "Japan", "Mexico", "Russia", "Saudi Arabia", "South Africa",
            "South Korea", "Turkey", "United Kingdom", "United States", "European Union",
        ],
    ),
    (
        "BRICS",
        &[
            "Brazil", "Russia", "India", "China", "South Africa", "Egypt", "Ethiopia", "Iran",
            "Saudi Arabia", "United Arab Emirates",
        ],
    ),
];
