//! Startup data: bootstrap admin and the sample catalog

use anyhow::{Context, Result};
use tracing::info;

use auth::AuthService;

use crate::{models::NewProduct, repositories::ProductStore};

struct SampleProduct {
    name: &'static str,
    description: &'static str,
    price: f64,
    image: &'static str,
    brand: &'static str,
    category: &'static str,
    rating: f64,
}

const SAMPLE_PRODUCTS: [SampleProduct; 8] = [
    SampleProduct {
        name: "Chyawanprash",
        description: "A traditional Ayurvedic health supplement made from a concentrated blend of nutrient-rich herbs and minerals. Boosts immunity and strength.",
        price: 350.0,
        image: "https://images.pexels.com/photos/6169859/pexels-photo-6169859.jpeg?auto=compress&cs=tinysrgb&w=600",
        brand: "Dabur",
        category: "Immune Support",
        rating: 4.5,
    },
    SampleProduct {
        name: "Ashwagandha Capsules",
        description: "Helps reduce stress and anxiety while improving concentration and energy levels. A powerful adaptogen for modern lifestyles.",
        price: 280.0,
        image: "https://images.pexels.com/photos/4041392/pexels-photo-4041392.jpeg?auto=compress&cs=tinysrgb&w=600",
        brand: "Zandu",
        category: "Stress Relief",
        rating: 4.3,
    },
    SampleProduct {
        name: "Triphala Churna",
        description: "A traditional Ayurvedic formulation made from three fruits. Supports digestive health, detoxification, and regular elimination.",
        price: 220.0,
        image: "https://images.pexels.com/photos/6942823/pexels-photo-6942823.jpeg?auto=compress&cs=tinysrgb&w=600",
        brand: "Punarvasu",
        category: "Digestive Health",
        rating: 4.7,
    },
    SampleProduct {
        name: "Shankhpushpi Syrup",
        description: "A natural brain tonic that enhances memory, concentration, and cognitive functions. Ideal for students and professionals.",
        price: 180.0,
        image: "https://images.pexels.com/photos/8989497/pexels-photo-8989497.jpeg?auto=compress&cs=tinysrgb&w=600",
        brand: "Unjha",
        category: "Brain Health",
        rating: 4.2,
    },
    SampleProduct {
        name: "Amla Juice",
        description: "Rich in Vitamin C, this juice supports immunity, skin health, and digestion. A daily health tonic for the whole family.",
        price: 150.0,
        image: "https://images.pexels.com/photos/7469189/pexels-photo-7469189.jpeg?auto=compress&cs=tinysrgb&w=600",
        brand: "Dabur",
        category: "Juices",
        rating: 4.6,
    },
    SampleProduct {
        name: "Brahmi Ghrita",
        description: "A medicated ghee preparation that supports mental clarity, memory, and cognitive function. Traditional brain tonic.",
        price: 320.0,
        image: "https://images.pexels.com/photos/5940829/pexels-photo-5940829.jpeg?auto=compress&cs=tinysrgb&w=600",
        brand: "Zandu",
        category: "Brain Health",
        rating: 4.4,
    },
    SampleProduct {
        name: "Neem Tablets",
        description: "Supports skin health and blood purification. Known for its antibacterial and antifungal properties.",
        price: 190.0,
        image: "https://images.pexels.com/photos/6942048/pexels-photo-6942048.jpeg?auto=compress&cs=tinysrgb&w=600",
        brand: "Punarvasu",
        category: "Skin Health",
        rating: 4.1,
    },
    SampleProduct {
        name: "Haritaki Powder",
        description: "Supports digestive health and regular elimination. One of the three fruits in Triphala, known for its rejuvenating properties.",
        price: 210.0,
        image: "https://images.pexels.com/photos/6941875/pexels-photo-6941875.jpeg?auto=compress&cs=tinysrgb&w=600",
        brand: "Unjha",
        category: "Digestive Health",
        rating: 4.5,
    },
];

impl SampleProduct {
    fn to_new_product(&self) -> NewProduct {
        NewProduct {
            name: self.name.to_string(),
            description: Some(self.description.to_string()),
            price: self.price,
            image: Some(self.image.to_string()),
            brand: Some(self.brand.to_string()),
            category: Some(self.category.to_string()),
            in_stock: true,
            rating: self.rating,
        }
    }
}

/// Insert the sample catalog into an empty product table.
///
/// Returns the number of products inserted.
pub async fn seed_sample_products(products: &dyn ProductStore) -> Result<usize> {
    if products.count().await.context("Failed to count products")? > 0 {
        return Ok(0);
    }

    for sample in &SAMPLE_PRODUCTS {
        products
            .create(&sample.to_new_product())
            .await
            .with_context(|| format!("Failed to seed product {}", sample.name))?;
    }

    info!("Sample products added successfully");
    Ok(SAMPLE_PRODUCTS.len())
}

/// Create the admin account and, if enabled, the sample catalog
pub async fn bootstrap(
    auth: &AuthService,
    products: &dyn ProductStore,
    admin_password: &str,
    seed_products: bool,
) -> Result<()> {
    auth.ensure_admin(admin_password)
        .await
        .context("Failed to create admin user")?;

    if seed_products {
        seed_sample_products(products).await?;
    }

    Ok(())
}
