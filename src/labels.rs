//! Component names and axis labels for known OpenFOAM fields.

/// Name and axis label of one field component
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentLabel {
    pub name: String,
    pub axis_label: String,
}

impl ComponentLabel {
    fn new(name: &str, axis_label: &str) -> Self {
        Self {
            name: name.to_string(),
            axis_label: axis_label.to_string(),
        }
    }
}

const KNOWN_FIELDS: &[(&str, &[(&str, &str)])] = &[
    (
        "U",
        &[
            ("Ux", "U_x [m/s]"),
            ("Uy", "U_y [m/s]"),
            ("Uz", "U_z [m/s]"),
        ],
    ),
    ("p", &[("p", "p [m^2/s^2]")]),
    ("k", &[("k", "k [m^2/s^2]")]),
    ("omega", &[("omega", "omega [1/s]")]),
    ("nut", &[("nut", "nu_t [m^2/s]")]),
    ("kDeficit", &[("kDeficit", "R [m^2/s^3]")]),
    (
        "bijDelta",
        &[
            ("b11Delta", "b_11^Delta [-]"),
            ("b12Delta", "b_12^Delta [-]"),
            ("b13Delta", "b_13^Delta [-]"),
            ("b22Delta", "b_22^Delta [-]"),
            ("b23Delta", "b_23^Delta [-]"),
            ("b33Delta", "b_33^Delta [-]"),
        ],
    ),
];

/// Labels for each component of `field`.
///
/// Unknown fields, or known fields sampled with an unexpected width, get
/// generated names: the field name itself for scalars, `<field>x/y/z` for
/// three-component vectors and `<field><i>` otherwise.
pub fn component_labels(field: &str, components: usize) -> Vec<ComponentLabel> {
    let known = KNOWN_FIELDS
        .iter()
        .find(|(name, labels)| *name == field && labels.len() == components);

    if let Some((_, labels)) = known {
        return labels
            .iter()
            .map(|(name, axis)| ComponentLabel::new(name, axis))
            .collect();
    }

    match components {
        1 => vec![ComponentLabel::new(field, field)],
        3 => ["x", "y", "z"]
            .iter()
            .map(|axis| {
                let name = format!("{}{}", field, axis);
                ComponentLabel::new(&name, &name)
            })
            .collect(),
        _ => (0..components)
            .map(|i| {
                let name = format!("{}{}", field, i);
                ComponentLabel::new(&name, &name)
            })
            .collect(),
    }
}

/// Legend label for a residual column
pub fn residual_label(column: &str) -> String {
    match column {
        "ux" => "U_x".to_string(),
        "uy" => "U_y".to_string(),
        "uz" => "U_z".to_string(),
        "nut" => "nu_t".to_string(),
        other => other.to_string(),
    }
}
