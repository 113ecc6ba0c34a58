use aura_contracts::analysis::{CareProduct, CareStep, ImageRef, SkinCarePlan};

/// Care plan for a skin-condition label. Unrecognized labels take the
/// Normal plan, so the lookup is total.
pub fn plan_for(label: &str) -> SkinCarePlan {
    match label.trim() {
        "Dry" => dry_plan(),
        "Oily" => oily_plan(),
        "Acne" => acne_plan(),
        _ => normal_plan(),
    }
}

fn normal_plan() -> SkinCarePlan {
    SkinCarePlan {
        label: "Normal".to_string(),
        botanicals:
            "Weekly Matcha face masks or Rosehip oil infusions will maintain your natural radiance."
                .to_string(),
        morning: vec![
            step("Purify", "Gentle Cleanser", "Maintain moisture balance."),
            step("Activate", "Vitamin C Serum", "Boost collagen and protect."),
            step("Protect", "Mineral SPF 30", "Shield from UV damage."),
        ],
        evening: vec![
            step("Unveil", "Oil-Based Cleanser", "Remove environmental pollutants."),
            step("Nourish", "Hyaluronic Acid", "Dewy hydration overnight."),
            step("Seal", "Light Moisturizer", "Lock in active nutrients."),
        ],
        products: vec![
            product(
                "Velvet Cloud Cleanser",
                "https://images.unsplash.com/photo-1556223213-920407632941?auto=format&fit=crop&q=80",
            ),
            product(
                "Rose Quartz Serum",
                "https://images.unsplash.com/photo-1620916566398-39f1143ab7be?auto=format&fit=crop&q=80",
            ),
        ],
    }
}

fn dry_plan() -> SkinCarePlan {
    SkinCarePlan {
        label: "Dry".to_string(),
        botanicals: "Incorporate Avocado oil or Oat-based masks to restore the lipid barrier."
            .to_string(),
        morning: vec![
            step("Purify", "Cream Cleanser", "Wash without stripping oils."),
            step("Activate", "Hydrating Essence", "Deep cellular saturation."),
            step("Protect", "Barrier Cream", "Rich moisture lock."),
        ],
        evening: vec![
            step("Unveil", "Balm Cleanser", "Deep melt of makeup and impurities."),
            step("Nourish", "Squalane Oil", "Intensive skin repair and glow."),
            step("Seal", "Ceramide Balm", "Ultimate overnight restoration."),
        ],
        products: vec![
            product(
                "Dewy Nectar Oil",
                "https://images.unsplash.com/photo-1608248597279-f99d160bfcbc?auto=format&fit=crop&q=80",
            ),
            product(
                "Silk Barrier Balm",
                "https://images.unsplash.com/photo-1598440947619-2c35fc9aa908?auto=format&fit=crop&q=80",
            ),
        ],
    }
}

fn oily_plan() -> SkinCarePlan {
    SkinCarePlan {
        label: "Oily".to_string(),
        botanicals:
            "Tea Tree leaf steam sessions and Clay-based toners will balance sebum production."
                .to_string(),
        morning: vec![
            step("Purify", "Gel Purifier", "Clear excess oil and debris."),
            step("Activate", "Niacinamide", "Minimize pores and stabilize sebum."),
            step("Protect", "Matte SPF", "Weightless protection."),
        ],
        evening: vec![
            step("Unveil", "Double Wash", "Deep pore purification."),
            step("Nourish", "Salicylic Liquid", "Clear cellular congestion."),
            step("Seal", "Oil-Free Water Gel", "Hydrate without heaviness."),
        ],
        products: vec![
            product(
                "Arctic Clarity Gel",
                "https://images.unsplash.com/photo-1556227702-d1e4e7ca5c23?auto=format&fit=crop&q=80",
            ),
            product(
                "Obsidian Pore Mist",
                "https://images.unsplash.com/photo-1624454002302-36b824d7bd0a?auto=format&fit=crop&q=80",
            ),
        ],
    }
}

fn acne_plan() -> SkinCarePlan {
    SkinCarePlan {
        label: "Acne".to_string(),
        botanicals:
            "Weekly Turmeric & Honey infusions will soothe inflammation and clear texture."
                .to_string(),
        morning: vec![
            step("Purify", "Sulfur Wash", "Anti-microbial surface cleaning."),
            step("Activate", "Zinc Serum", "Reduce redness and swelling."),
            step("Protect", "Non-Comedogenic SPF", "Blemish-safe protection."),
        ],
        evening: vec![
            step("Unveil", "Micellar Water", "Gentle, friction-free clearing."),
            step("Nourish", "Azelaic Acid", "Repair post-acne marks."),
            step("Seal", "Lightweight Repair", "Soothe without clogging."),
        ],
        products: vec![
            product(
                "Zen Clarity Drops",
                "https://images.unsplash.com/photo-1617897903246-7392ce7ec77a?auto=format&fit=crop&q=80",
            ),
            product(
                "Lunar Blemish Relief",
                "https://images.unsplash.com/photo-1620917670397-dc71bce6d21d?auto=format&fit=crop&q=80",
            ),
        ],
    }
}

fn step(step: &str, title: &str, detail: &str) -> CareStep {
    CareStep {
        step: step.to_string(),
        title: title.to_string(),
        detail: detail.to_string(),
    }
}

fn product(name: &str, image: &str) -> CareProduct {
    CareProduct {
        name: name.to_string(),
        brand: "Aura Atelier".to_string(),
        image: ImageRef::new(image),
    }
}
