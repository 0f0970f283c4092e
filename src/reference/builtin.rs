//! Built-in reference tables used when no reference file is configured.
//!
//! Concentrations are grams per kilogram of fresh waste. Crop targets are
//! kg/ha requirements on the same scale as farmer soil tests.

use crate::types::{CropTarget, NutrientConcentration, Producer};

use super::waste_classes::WasteClass;
use super::RawReferenceData;

pub fn reference_data() -> RawReferenceData {
    RawReferenceData {
        nutrients: nutrients(),
        crops: crops(),
        waste_classes: waste_classes(),
        producers: producers(),
    }
}

fn nutrients() -> Vec<NutrientConcentration> {
    [
        ("Apple", 3.5, 1.1, 5.5),
        ("Apple-core", 3.0, 1.0, 5.0),
        ("Apple-peel", 4.5, 1.2, 6.0),
        ("Banana", 10.0, 2.5, 42.0),
        ("Bone", 40.0, 100.0, 2.0),
        ("Bone-fish", 45.0, 80.0, 3.0),
        ("Bread", 18.0, 2.0, 3.0),
        ("Cucumber", 22.0, 5.0, 33.0),
        ("Egg-shell", 12.0, 1.2, 1.5),
        ("Fish", 90.0, 30.0, 8.0),
        ("Meat", 100.0, 18.0, 10.0),
        ("Mushroom", 45.0, 10.0, 40.0),
        ("Orange-peel", 12.0, 1.5, 9.0),
        ("Pear-peel", 5.0, 1.0, 7.0),
        ("Potato", 15.0, 3.0, 45.0),
        ("Rice", 12.0, 3.0, 3.0),
        ("Shrimp-shell", 60.0, 20.0, 5.0),
        ("Tofu", 70.0, 6.0, 10.0),
        ("Tomato", 30.0, 6.0, 40.0),
        ("Vegetable", 25.0, 5.0, 30.0),
        ("Vegetable-root", 15.0, 4.0, 25.0),
    ]
    .into_iter()
    .map(|(label, n, p, k)| NutrientConcentration::new(label, n, p, k))
    .collect()
}

fn crops() -> Vec<CropTarget> {
    [
        ("rice", 90.0, 45.0, 45.0),
        ("maize", 78.0, 48.0, 20.0),
        ("chickpea", 40.0, 68.0, 80.0),
        ("kidneybeans", 21.0, 67.0, 20.0),
        ("pigeonpeas", 21.0, 68.0, 20.0),
        ("mungbean", 21.0, 47.0, 20.0),
        ("blackgram", 40.0, 67.0, 19.0),
        ("lentil", 19.0, 68.0, 19.0),
        ("pomegranate", 19.0, 19.0, 40.0),
        ("banana", 100.0, 82.0, 50.0),
        ("mango", 20.0, 27.0, 30.0),
        ("grapes", 23.0, 133.0, 200.0),
        ("watermelon", 99.0, 17.0, 50.0),
        ("apple", 21.0, 134.0, 200.0),
        ("orange", 20.0, 17.0, 10.0),
        ("papaya", 50.0, 59.0, 50.0),
        ("coconut", 22.0, 17.0, 31.0),
        ("cotton", 118.0, 46.0, 20.0),
        ("jute", 78.0, 47.0, 40.0),
        ("coffee", 101.0, 29.0, 30.0),
    ]
    .into_iter()
    .map(|(label, n, p, k)| CropTarget::new(label, n, p, k))
    .collect()
}

fn waste_classes() -> Vec<WasteClass> {
    [
        "Banana",
        "Bone",
        "Egg-shell",
        "Fish",
        "Orange-peel",
        "Vegetable",
        "Apple-peel",
        "Shrimp-shell",
        "Potato",
        "Tomato",
    ]
    .into_iter()
    .zip(0..)
    .map(|(label, class_id)| WasteClass {
        class_id,
        waste_label: label.to_string(),
    })
    .collect()
}

fn producers() -> Vec<Producer> {
    [
        ("P-001", "Azadpur Mandi Organics", "+91-11-4000-0001", 28.7041, 77.1025),
        ("P-002", "Okhla Food Waste Hub", "+91-11-4000-0002", 28.5355, 77.2910),
        ("P-003", "Gurugram Kitchen Collective", "+91-124-400-0003", 28.4595, 77.0266),
        ("P-004", "Noida Compost Co-op", "+91-120-400-0004", 28.5355, 77.3910),
        ("P-005", "Meerut Agro Residue", "+91-121-400-0005", 28.9845, 77.7064),
    ]
    .into_iter()
    .map(|(id, name, contact, latitude, longitude)| Producer {
        producer_id: id.to_string(),
        name: name.to_string(),
        contact: contact.to_string(),
        latitude,
        longitude,
    })
    .collect()
}
