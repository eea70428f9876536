// 🏷️ Category Families - Keyword tables for category inference
// Families are data, not code: adding a rubro means adding a row here.

use crate::record::DEFAULT_CATEGORY;

/// One domain keyword family. The first family whose keyword appears in a
/// provider name (case-insensitively) supplies the default category.
pub struct CategoryFamily {
    pub name: &'static str,
    pub icon: &'static str,
    pub keywords: &'static [&'static str],
}

/// Ordered keyword families, most specific trades first.
pub static CATEGORY_FAMILIES: &[CategoryFamily] = &[
    CategoryFamily {
        name: "Construcción",
        icon: "🏗️",
        keywords: &["constru", "obra", "edific", "ingenier", "arquitect"],
    },
    CategoryFamily {
        name: "Materiales",
        icon: "🧱",
        keywords: &[
            "material", "arido", "árido", "cemento", "hormigon", "hormigón", "fierro", "acero",
            "madera",
        ],
    },
    CategoryFamily {
        name: "Herramientas",
        icon: "🔧",
        keywords: &["herramienta", "ferreter", "maquinaria", "equipo"],
    },
    CategoryFamily {
        name: "Servicios",
        icon: "🧰",
        keywords: &["servicio", "asesor", "consultor", "mantencion", "mantención"],
    },
    CategoryFamily {
        name: "Transporte",
        icon: "🚚",
        keywords: &["transport", "flete", "camion", "camión", "grua", "grúa"],
    },
    CategoryFamily {
        name: "Eléctrico",
        icon: "⚡",
        keywords: &["electric", "eléctric", "iluminac", "cable"],
    },
    CategoryFamily {
        name: "Gasfitería",
        icon: "🚿",
        keywords: &["gasfiter", "sanitario", "plomer"],
    },
    CategoryFamily {
        name: "Terminaciones",
        icon: "🎨",
        keywords: &["pintur", "terminacion", "terminación", "revestimiento", "ceramic", "cerámic"],
    },
];

/// Infer the default category list from a provider name.
/// First matching family wins; no match falls back to `["General"]`.
pub fn infer_categories(name: &str) -> Vec<String> {
    let lower = name.to_lowercase();

    for family in CATEGORY_FAMILIES {
        if family.keywords.iter().any(|kw| lower.contains(kw)) {
            return vec![family.name.to_string()];
        }
    }

    vec![DEFAULT_CATEGORY.to_string()]
}

/// Display icon for a category name ("📦" for anything outside the table).
pub fn icon_for(category: &str) -> &'static str {
    CATEGORY_FAMILIES
        .iter()
        .find(|f| f.name == category)
        .map(|f| f.icon)
        .unwrap_or("📦")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infers_construccion_from_name() {
        assert_eq!(infer_categories("ACME CONSTRUCTORA LTDA"), vec!["Construcción"]);
        assert_eq!(infer_categories("Ingeniería y Obras del Sur"), vec!["Construcción"]);
    }

    #[test]
    fn test_first_family_wins() {
        // Name matches both Construcción and Materiales; table order decides
        assert_eq!(
            infer_categories("CONSTRUCTORA DE MATERIALES SA"),
            vec!["Construcción"]
        );
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(infer_categories("transportes del maipo"), vec!["Transporte"]);
    }

    #[test]
    fn test_unmatched_name_falls_back_to_general() {
        assert_eq!(infer_categories("Juan Pérez Gómez"), vec!["General"]);
    }

    #[test]
    fn test_icon_lookup() {
        assert_eq!(icon_for("Transporte"), "🚚");
        assert_eq!(icon_for("General"), "📦");
    }
}
