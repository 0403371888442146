//! Seed catalog loaded into every fresh store.

use crate::{Category, Dimensions, NewBaseDesign, NewSubDesign, Specifications, SubDesignKind};

fn specs(materials: &[&str], width: &str, height: &str, depth: &str, weight: &str) -> Specifications {
    Specifications {
        materials: materials.iter().map(|m| m.to_string()).collect(),
        dimensions: Dimensions {
            width: width.to_string(),
            height: height.to_string(),
            depth: depth.to_string(),
        },
        weight: weight.to_string(),
    }
}

fn base(
    name: &str,
    category: Category,
    description: &str,
    photo: &str,
    specifications: Specifications,
) -> NewBaseDesign {
    NewBaseDesign {
        name: name.to_string(),
        category,
        description: description.to_string(),
        image_url: unsplash(photo),
        specifications: Some(specifications),
    }
}

/// Build a 400x400 Unsplash crop URL for a photo id.
pub fn unsplash(photo: &str) -> String {
    format!(
        "https://images.unsplash.com/{photo}?ixlib=rb-4.0.3&auto=format&fit=crop&w=400&h=400"
    )
}

pub fn base_designs() -> Vec<NewBaseDesign> {
    vec![
        base(
            "Classic Solitaire",
            Category::Rings,
            "Timeless diamond solitaire ring with platinum band",
            "photo-1605100804763-247f67b3557e",
            specs(&["Platinum", "Diamond"], "10mm", "15mm", "5mm", "3.2g"),
        ),
        base(
            "Pearl Elegance",
            Category::Necklaces,
            "Elegant pearl necklace with gold chain",
            "photo-1515562141207-7a88fb7ce338",
            specs(&["Gold", "Pearl"], "450mm", "12mm", "8mm", "15.6g"),
        ),
        base(
            "Geometric Drop",
            Category::Earrings,
            "Modern geometric earrings with gemstones",
            "photo-1617038260897-41a1f14a8ca0",
            specs(&["Gold", "Sapphire"], "8mm", "25mm", "4mm", "2.8g"),
        ),
        base(
            "Tennis Classic",
            Category::Bracelets,
            "Diamond tennis bracelet with uniform stones",
            "photo-1515562141207-7a88fb7ce338",
            specs(&["Gold", "Diamond"], "180mm", "6mm", "3mm", "8.4g"),
        ),
        base(
            "Art Deco Luxury",
            Category::Rings,
            "Art deco inspired ring with geometric patterns",
            "photo-1603561596112-0a132b757442",
            specs(&["White Gold", "Emerald", "Diamond"], "12mm", "18mm", "6mm", "4.1g"),
        ),
        base(
            "Bold Statement",
            Category::Necklaces,
            "Multi-layer geometric necklace",
            "photo-1506630448388-4e683c67ddb0",
            specs(&["Gold", "Diamond"], "500mm", "25mm", "10mm", "28.3g"),
        ),
    ]
}

pub fn sub_designs() -> Vec<NewSubDesign> {
    [
        ("Diamond Accent", SubDesignKind::Enhancement, "Add diamond accents", "fas fa-star"),
        ("Engraving", SubDesignKind::Modification, "Custom engraving", "fas fa-font"),
        ("Gold Plating", SubDesignKind::Enhancement, "Gold plating finish", "fas fa-palette"),
        ("Gemstone", SubDesignKind::Enhancement, "Add gemstones", "fas fa-gem"),
        ("Vintage Style", SubDesignKind::Modification, "Vintage styling", "fas fa-crown"),
        ("Modern Polish", SubDesignKind::Enhancement, "Modern polish finish", "fas fa-circle"),
    ]
    .into_iter()
    .map(|(name, kind, description, icon)| NewSubDesign {
        name: name.to_string(),
        kind,
        description: description.to_string(),
        icon_name: icon.to_string(),
    })
    .collect()
}
