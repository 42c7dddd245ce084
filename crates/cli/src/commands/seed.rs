//! Catalog seeding command.
//!
//! Inserts a sample catalog for local development. Skips entirely if any
//! products already exist, so it is safe to run on every boot of a dev
//! environment.

use rust_decimal::Decimal;

use super::CommandError;

/// name, description, price in cents, image URL, category, stock.
type SeedProduct = (&'static str, &'static str, i64, &'static str, &'static str, i32);

const PRODUCTS: &[SeedProduct] = &[
    (
        "Wireless Bluetooth Headphones",
        "Premium noise-cancelling over-ear headphones with 30-hour battery life. Deep bass, crystal clear highs, and comfortable ear cushions for all-day wear.",
        8999,
        "https://images.unsplash.com/photo-1505740420928-5e560c06d30e?w=500&h=500&fit=crop",
        "Electronics",
        50,
    ),
    (
        "Ergonomic Office Chair",
        "Adjustable lumbar support office chair with breathable mesh back. 360-degree swivel, adjustable height, and armrests for maximum comfort during long work sessions.",
        24999,
        "https://images.unsplash.com/photo-1580480055273-228ff5388ef8?w=500&h=500&fit=crop",
        "Furniture",
        25,
    ),
    (
        "Stainless Steel Water Bottle",
        "Insulated 32oz water bottle keeps drinks cold for 24 hours or hot for 12 hours. BPA-free, leak-proof design with wide mouth for easy cleaning.",
        2499,
        "https://images.unsplash.com/photo-1602143407151-7111542de6e8?w=500&h=500&fit=crop",
        "Home & Kitchen",
        100,
    ),
    (
        "Mechanical Gaming Keyboard",
        "RGB backlit mechanical keyboard with Cherry MX Blue switches. Full N-key rollover, aluminum frame, and programmable macro keys for gaming enthusiasts.",
        12999,
        "https://images.unsplash.com/photo-1587829741301-dc798b83add3?w=500&h=500&fit=crop",
        "Electronics",
        40,
    ),
    (
        "Yoga Mat with Carrying Strap",
        "Extra thick 6mm yoga mat with non-slip surface. Eco-friendly TPE material, lightweight, and includes carrying strap for easy transport.",
        3499,
        "https://images.unsplash.com/photo-1601925260368-ae2f83cf8b7f?w=500&h=500&fit=crop",
        "Sports & Outdoors",
        75,
    ),
    (
        "Smart Watch Fitness Tracker",
        "Advanced fitness tracking with heart rate monitor, sleep tracking, and GPS. 7-day battery life, water-resistant, and compatible with iOS and Android.",
        19999,
        "https://images.unsplash.com/photo-1523275335684-37898b6baf30?w=500&h=500&fit=crop",
        "Electronics",
        60,
    ),
    (
        "Premium Coffee Maker",
        "Programmable 12-cup coffee maker with thermal carafe. Brew strength control, auto shut-off, and permanent filter included.",
        7999,
        "https://images.unsplash.com/photo-1517668808822-9ebb02f2a0e6?w=500&h=500&fit=crop",
        "Home & Kitchen",
        35,
    ),
    (
        "Leather Laptop Backpack",
        "Professional leather backpack with padded laptop compartment (fits up to 15.6 inch). Multiple pockets, USB charging port, and water-resistant design.",
        8999,
        "https://images.unsplash.com/photo-1553062407-98eeb64c6a62?w=500&h=500&fit=crop",
        "Bags & Accessories",
        45,
    ),
    (
        "Wireless Gaming Mouse",
        "High-precision wireless mouse with 16,000 DPI sensor. Customizable RGB lighting, 8 programmable buttons, and 70-hour battery life.",
        6999,
        "https://images.unsplash.com/photo-1527814050087-3793815479db?w=500&h=500&fit=crop",
        "Electronics",
        80,
    ),
    (
        "Portable Bluetooth Speaker",
        "Waterproof portable speaker with 360-degree sound. 12-hour playtime, deep bass, and built-in microphone for hands-free calls.",
        4999,
        "https://images.unsplash.com/photo-1608043152269-423dbba4e7e1?w=500&h=500&fit=crop",
        "Electronics",
        90,
    ),
    (
        "Dumbbell Set with Rack",
        "Adjustable dumbbell set from 5-50 lbs with storage rack. Space-saving design, quick-change weight selection, perfect for home gym.",
        29999,
        "https://images.unsplash.com/photo-1599058917212-d750089bc07e?w=500&h=500&fit=crop",
        "Sports & Outdoors",
        20,
    ),
    (
        "Standing Desk Converter",
        "Height-adjustable standing desk converter. Smooth lift mechanism, spacious workspace, and keyboard tray for ergonomic comfort.",
        17999,
        "https://images.unsplash.com/photo-1595515106969-1ce29566ff1c?w=500&h=500&fit=crop",
        "Furniture",
        30,
    ),
    (
        "Air Purifier with HEPA Filter",
        "3-stage filtration air purifier removes 99.97% of airborne particles. Quiet operation, smart sensor, and covers up to 500 sq ft.",
        14999,
        "https://images.unsplash.com/photo-1585771724684-38269d6639fd?w=500&h=500&fit=crop",
        "Home & Kitchen",
        40,
    ),
    (
        "USB-C Hub Multi-Adapter",
        "7-in-1 USB-C hub with HDMI 4K, USB 3.0 ports, SD card reader, and 100W power delivery. Compact and travel-friendly design.",
        3999,
        "https://images.unsplash.com/photo-1625948515291-69613efd103f?w=500&h=500&fit=crop",
        "Electronics",
        120,
    ),
    (
        "Memory Foam Pillow Set",
        "2-pack premium memory foam pillows with cooling gel layer. Hypoallergenic, adjustable loft, and machine-washable covers.",
        5999,
        "https://images.unsplash.com/photo-1584100936595-c0654b55a2e2?w=500&h=500&fit=crop",
        "Home & Kitchen",
        65,
    ),
];

/// Insert the sample catalog if the products table is empty.
pub async fn run() -> Result<(), CommandError> {
    let pool = super::connect().await?;

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
        .fetch_one(&pool)
        .await?;
    if count > 0 {
        tracing::info!("Products already present ({count}), skipping seed");
        return Ok(());
    }

    for (name, description, price_cents, image_url, category, stock) in PRODUCTS {
        sqlx::query(
            "INSERT INTO products (name, description, price, image_url, category, stock_quantity)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(name)
        .bind(description)
        .bind(Decimal::new(*price_cents, 2))
        .bind(image_url)
        .bind(category)
        .bind(stock)
        .execute(&pool)
        .await?;
    }

    tracing::info!("Seeded {} products", PRODUCTS.len());
    Ok(())
}
