//! Seed data for the demo shop: the product catalog and two shopper accounts.

use crate::core::types::{Product, User};

/// Category value meaning "no filter"
pub const ALL_CATEGORIES: &str = "All";

struct Seed {
    id: u32,
    name: &'static str,
    price: f64,
    stock: u32,
    category: &'static str,
    photo: &'static str,
    description: &'static str,
    rating: f64,
    reviews: u32,
}

const PRODUCTS: [Seed; 8] = [
    Seed {
        id: 1,
        name: "Floral Summer Dress",
        price: 89.99,
        stock: 15,
        category: "Dresses",
        photo: "photo-1572804013309-59a88b7e92f1",
        description: "Lightweight floral print dress perfect for summer days. Features adjustable straps and a flattering A-line silhouette.",
        rating: 4.7,
        reviews: 234,
    },
    Seed {
        id: 2,
        name: "Classic Denim Jacket",
        price: 129.99,
        stock: 8,
        category: "Jackets",
        photo: "photo-1551028719-00167b16eac5",
        description: "Timeless denim jacket with distressed details. Versatile piece that pairs with any outfit.",
        rating: 4.8,
        reviews: 567,
    },
    Seed {
        id: 3,
        name: "High-Waisted Skinny Jeans",
        price: 79.99,
        stock: 25,
        category: "Bottoms",
        photo: "photo-1541099649105-f69ad21f3246",
        description: "Comfortable stretch denim with a flattering high-waist fit. Available in multiple washes.",
        rating: 4.5,
        reviews: 892,
    },
    Seed {
        id: 4,
        name: "Silk Blouse - Ivory",
        price: 119.99,
        stock: 12,
        category: "Tops",
        photo: "photo-1564257577-6049b8f0f7d1",
        description: "Luxurious 100% silk blouse with delicate button details. Perfect for work or evening wear.",
        rating: 4.6,
        reviews: 312,
    },
    Seed {
        id: 5,
        name: "Maxi Wrap Dress",
        price: 149.99,
        stock: 10,
        category: "Dresses",
        photo: "photo-1595777457583-95e059d581b8",
        description: "Elegant wrap dress in flowing fabric. Features a tie waist and flattering V-neckline.",
        rating: 4.9,
        reviews: 421,
    },
    Seed {
        id: 6,
        name: "Leather Ankle Boots",
        price: 189.99,
        stock: 6,
        category: "Shoes",
        photo: "photo-1543163521-1bf539c55dd2",
        description: "Premium leather ankle boots with block heel. Comfortable and stylish for all-day wear.",
        rating: 4.7,
        reviews: 156,
    },
    Seed {
        id: 7,
        name: "Cashmere Sweater",
        price: 199.99,
        stock: 9,
        category: "Tops",
        photo: "photo-1434389677669-e08b4cac3105",
        description: "Soft 100% cashmere crewneck sweater. Available in multiple colors for layering.",
        rating: 4.8,
        reviews: 289,
    },
    Seed {
        id: 8,
        name: "Wide-Leg Trousers",
        price: 99.99,
        stock: 18,
        category: "Bottoms",
        photo: "photo-1594633312681-425c7b97ccd1",
        description: "Tailored wide-leg trousers with pleated front. Professional and comfortable fit.",
        rating: 4.6,
        reviews: 445,
    },
];

fn image_url(photo: &str) -> String {
    format!("https://images.unsplash.com/{}?w=500&h=500&fit=crop", photo)
}

/// The eight products the shop opens with
pub fn seed_products() -> Vec<Product> {
    PRODUCTS
        .iter()
        .map(|seed| Product {
            id: seed.id,
            name: seed.name.to_string(),
            price: seed.price,
            stock: seed.stock,
            category: seed.category.to_string(),
            image: image_url(seed.photo),
            description: seed.description.to_string(),
            rating: seed.rating,
            reviews: seed.reviews,
            in_stock: true,
        })
        .collect()
}

/// Demo accounts
pub fn seed_users() -> Vec<User> {
    vec![
        User {
            id: 1,
            email: "demo@chiccloset.com".to_string(),
            name: "Fashion Lover".to_string(),
            password: "demo123".to_string(),
        },
        User {
            id: 2,
            email: "jane@example.com".to_string(),
            name: "Jane Smith".to_string(),
            password: "password".to_string(),
        },
    ]
}

/// `None`, empty and `"All"` mean every category
pub fn matches_category(product: &Product, category: Option<&str>) -> bool {
    match category {
        None | Some("") | Some(ALL_CATEGORIES) => true,
        Some(category) => product.category == category,
    }
}
