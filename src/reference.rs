//! Static reference data: category taxonomy, sample companies, demo accounts.

use serde::Serialize;

/// Category id meaning "no category filter".
pub const ALL_CATEGORIES: &str = "all";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Category {
    pub id: &'static str,
    pub label: &'static str,
    pub icon: &'static str,
}

const fn category(id: &'static str, label: &'static str, icon: &'static str) -> Category {
    Category { id, label, icon }
}

pub const CATEGORIES: &[Category] = &[
    category(ALL_CATEGORIES, "All", "fa-th-large"),
    category("kirtasiye", "Stationery", "fa-pen"),
    category("yemek", "Meals", "fa-utensils"),
    category("giyim", "Clothing", "fa-tshirt"),
    category("elektronik", "Electronics", "fa-laptop"),
    category("gida", "Groceries", "fa-shopping-basket"),
];

const CLOTHING: &[Category] = &[
    category("ust-giyim", "Tops", "fa-tshirt"),
    category("alt-giyim", "Bottoms", "fa-socks"),
    category("ayakkabi", "Shoes", "fa-shoe-prints"),
    category("dis-giyim", "Outerwear", "fa-vest"),
    category("aksesuar", "Accessories", "fa-gem"),
    category("ic-giyim", "Underwear", "fa-tshirt"),
    category("spor-giyim", "Sportswear", "fa-running"),
    category("okul-formasi", "School Uniform", "fa-graduation-cap"),
];

const ELECTRONICS: &[Category] = &[
    category("bilgisayar", "Computers", "fa-laptop"),
    category("telefon", "Phones", "fa-mobile-alt"),
    category("tablet", "Tablets", "fa-tablet-alt"),
    category("kulaklik", "Headphones", "fa-headphones"),
    category("kamera", "Cameras", "fa-camera"),
    category("yazici", "Printers", "fa-print"),
    category("monitor", "Monitors", "fa-desktop"),
    category("klavye-mouse", "Keyboard & Mouse", "fa-keyboard"),
];

const GROCERIES: &[Category] = &[
    category("temel-gida", "Staples", "fa-bread-slice"),
    category("sut-urunleri", "Dairy", "fa-cheese"),
    category("et-balik", "Meat & Fish", "fa-drumstick-bite"),
    category("meyve-sebze", "Fruit & Vegetables", "fa-apple-alt"),
    category("bakliyat", "Pulses", "fa-seedling"),
    category("icecek", "Drinks", "fa-glass-water"),
    category("atistirmalik", "Snacks", "fa-cookie"),
    category("hazir-yemek", "Ready Meals", "fa-utensils"),
];

/// Sub-categories of a top-level category; empty when it has none.
pub fn sub_categories(category_id: &str) -> &'static [Category] {
    match category_id {
        "giyim" => CLOTHING,
        "elektronik" => ELECTRONICS,
        "gida" => GROCERIES,
        _ => &[],
    }
}

pub fn find_category(category_id: &str) -> Option<&'static Category> {
    CATEGORIES.iter().find(|c| c.id == category_id)
}

pub const COMPANIES: &[&str] = &[
    "Lezzet Dunyasi",
    "TeknoStore",
    "Moda Evi",
    "Dost Kitabevi",
    "Kampus Copy",
    "Ayakkabi Dunyasi",
    "Elektronik Market",
    "Gida Marketi",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Donor,
    Business,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DemoUser {
    pub username: &'static str,
    pub role: Role,
    pub name: &'static str,
}

/// Placeholder accounts seeded on demo backends.
pub const DEMO_USERS: &[DemoUser] = &[
    DemoUser {
        username: "ogrenci",
        role: Role::Student,
        name: "Ahmet Yilmaz",
    },
    DemoUser {
        username: "gonullu",
        role: Role::Donor,
        name: "Zeynep Demir",
    },
    DemoUser {
        username: "isletme",
        role: Role::Business,
        name: "Dost Kitabevi",
    },
];
