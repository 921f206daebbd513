use crate::models::ExtractedRequirement;

/// Missing-field labels, in the fixed order they are asked for
const FIELD_LABELS: [(&str, fn(&ExtractedRequirement) -> &Option<String>); 5] = [
    ("product", |r| &r.product),
    ("location", |r| &r.location),
    ("quantity required", |r| &r.quantity),
    ("delivery pincode", |r| &r.pincode),
    ("delivery timeframe (in days)", |r| &r.delivery_days),
];

fn present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

/// Labels of every field still missing from the requirement, in fixed order
pub fn missing_fields(requirement: &ExtractedRequirement) -> Vec<&'static str> {
    FIELD_LABELS
        .iter()
        .filter(|(_, get)| !present(get(requirement)))
        .map(|(label, _)| *label)
        .collect()
}

/// The requirement is complete when all five fields are populated
pub fn is_complete(requirement: &ExtractedRequirement) -> bool {
    missing_fields(requirement).is_empty()
}

/// Build the follow-up question for an incomplete requirement, with a recap
/// of the fields already known. Returns None when nothing is missing.
pub fn follow_up_message(requirement: &ExtractedRequirement) -> Option<String> {
    let mut missing = missing_fields(requirement);
    if missing.is_empty() {
        return None;
    }

    let mut response = if missing.len() == 1 {
        format!(
            "I need one more piece of information: could you please provide the {}?\n\n",
            missing[0]
        )
    } else {
        let last = missing.pop().expect("missing has at least two entries");
        format!(
            "I need a few more details: could you please provide the {} and {}?\n\n",
            missing.join(", "),
            last
        )
    };

    response.push_str(&recap_known(requirement));
    Some(response)
}

/// Recap block listing only the already-known fields; empty when none are
fn recap_known(requirement: &ExtractedRequirement) -> String {
    let known: [(&str, &Option<String>); 5] = [
        ("Product", &requirement.product),
        ("Location", &requirement.location),
        ("Quantity", &requirement.quantity),
        ("Pincode", &requirement.pincode),
        ("Delivery timeframe", &requirement.delivery_days),
    ];

    if !known.iter().any(|(_, v)| present(v)) {
        return String::new();
    }

    let mut recap = String::from("Here's what I already know:\n");
    for (label, value) in known {
        if let Some(value) = value {
            if !value.trim().is_empty() {
                recap.push_str(&format!("- {label}: {value}\n"));
            }
        }
    }
    recap.push('\n');
    recap
}

/// Confirmation block streamed once every field is present
pub fn confirmation_message(requirement: &ExtractedRequirement) -> String {
    format!(
        "I have all the information I need:\n- Product: {}\n- Location: {}\n- Quantity: {}\n- Pincode: {}\n- Delivery timeframe: {}\n\nI'm now searching for suppliers. This might take a moment...\n\n",
        requirement.product.as_deref().unwrap_or_default(),
        requirement.location.as_deref().unwrap_or_default(),
        requirement.quantity.as_deref().unwrap_or_default(),
        requirement.pincode.as_deref().unwrap_or_default(),
        requirement.delivery_days.as_deref().unwrap_or_default(),
    )
}
