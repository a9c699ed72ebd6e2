use tagged_orm::*;
use tracing_subscriber::EnvFilter;

#[tagged(table_name = "Locality")]
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Locality {
    #[tagged(key)]
    pub city_name: String,
    #[tagged(key)]
    pub country: String,
    pub population: i32,
}

#[tagged(table_name = "Cities")]
#[derive(Debug, Default, Clone, PartialEq)]
pub struct City {
    #[tagged(base)]
    pub locality: Locality,
    pub is_megapolis: Option<bool>,
}

fn city(city_name: &str, country: &str, population: i32, is_megapolis: bool) -> City {
    City {
        locality: Locality {
            city_name: city_name.into(),
            country: country.into(),
            population,
        },
        is_megapolis: Some(is_megapolis),
    }
}

#[tokio::main]
async fn main() -> OrmResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = OrmConfig::from_env()?;
    let mut conn = config.connect().await?;
    let registry = DaoRegistry::with_config(&config);
    let mut cities = registry.dao::<City>(&mut conn).await?;

    cities.insert(&city("Moscow", "Russia", 16_000_000, true)).await?;
    cities.insert(&city("Beloretsk", "Russia", 60_000, false)).await?;
    println!("All cities: {:?}", cities.select_all().await?);

    let key = city("Beloretsk", "Russia", 0, false);
    cities.update(&city("Beloretsk", "Russia", 75_000, false)).await?;
    println!("Updated: {:?}", cities.select_by_key(&key).await?);

    cities.delete_by_key(&city("Moscow", "Russia", 0, false)).await?;
    println!("Remaining: {}", cities.select_all().await?.len());

    Ok(())
}
