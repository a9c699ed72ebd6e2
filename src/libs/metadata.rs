//! Derives a [`TypeSchema`] from a type's descriptor chain.

use crate::libs::error::ConfigurationError;
use crate::libs::naming::to_column_case;
use crate::libs::schema::{FieldSchema, Mapped, TypeDescriptor, TypeSchema};

/// The table tag of the exact type. Ancestor tags are not consulted.
pub fn extract_table_name<T>(
    descriptor: &TypeDescriptor<T>,
) -> Result<&'static str, ConfigurationError> {
    match descriptor.table_name() {
        Some(name) if !name.is_empty() => Ok(name),
        _ => Err(ConfigurationError::NoTableTag {
            type_name: descriptor.type_name(),
        }),
    }
}

/// Every storable field of the type and its ancestors, most-derived first.
/// Fields without a storage mapping are skipped.
pub fn extract_all_fields<T: 'static>(descriptor: &TypeDescriptor<T>) -> Vec<FieldSchema<T>> {
    descriptor
        .lineage()
        .flat_map(|d| d.own_fields())
        .filter_map(|f| {
            let storage = f.storage?;
            let accessor = f.accessor.clone()?;
            Some(FieldSchema {
                member_name: f.member_name,
                column_name: to_column_case(f.member_name),
                storage,
                is_key: f.key,
                accessor,
            })
        })
        .collect()
}

/// Key-flagged subset of [`extract_all_fields`], same order.
pub fn extract_key_fields<T: 'static>(
    descriptor: &TypeDescriptor<T>,
) -> Result<Vec<FieldSchema<T>>, ConfigurationError> {
    let keys: Vec<_> = extract_all_fields(descriptor)
        .into_iter()
        .filter(|f| f.is_key)
        .collect();
    if keys.is_empty() {
        return Err(ConfigurationError::NoKeyFields {
            type_name: descriptor.type_name(),
        });
    }
    Ok(keys)
}

/// Table tag first, then key fields. A type failing both reports `NoTableTag`.
pub fn extract_schema<T: Mapped>() -> Result<TypeSchema<T>, ConfigurationError> {
    let descriptor = T::descriptor();
    let table_name = extract_table_name(&descriptor)?;
    let key_fields = extract_key_fields(&descriptor)?;
    Ok(TypeSchema {
        type_name: descriptor.type_name(),
        table_name,
        fields: extract_all_fields(&descriptor),
        key_fields,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::value::StorageType;

    #[derive(Default)]
    struct Locality {
        city_name: String,
        country: String,
        population: i32,
    }

    impl Mapped for Locality {
        fn descriptor() -> TypeDescriptor<Self> {
            TypeDescriptor::new("Locality")
                .table("Locality")
                .key("cityName", |l: &Locality| &l.city_name, |l| &mut l.city_name)
                .key("country", |l: &Locality| &l.country, |l| &mut l.country)
                .field("population", |l: &Locality| &l.population, |l| &mut l.population)
        }
    }

    #[derive(Default)]
    struct City {
        locality: Locality,
        is_megapolis: Option<bool>,
        aliases: Vec<String>,
    }

    impl Mapped for City {
        fn descriptor() -> TypeDescriptor<Self> {
            TypeDescriptor::new("City")
                .table("Cities")
                .field("isMegapolis", |c: &City| &c.is_megapolis, |c| &mut c.is_megapolis)
                .unmapped("aliases", "Vec<String>")
                .extends(Locality::descriptor().lift(|c: &City| &c.locality, |c| &mut c.locality))
        }
    }

    #[derive(Default)]
    struct Untagged {
        id: i32,
    }

    impl Mapped for Untagged {
        fn descriptor() -> TypeDescriptor<Self> {
            TypeDescriptor::new("Untagged").key("id", |u: &Untagged| &u.id, |u| &mut u.id)
        }
    }

    #[derive(Default)]
    struct Keyless {
        name: String,
    }

    impl Mapped for Keyless {
        fn descriptor() -> TypeDescriptor<Self> {
            TypeDescriptor::new("Keyless")
                .table("Keyless")
                .field("name", |k: &Keyless| &k.name, |k| &mut k.name)
        }
    }

    #[derive(Default)]
    struct Neither {
        name: String,
    }

    impl Mapped for Neither {
        fn descriptor() -> TypeDescriptor<Self> {
            TypeDescriptor::new("Neither").field("name", |n: &Neither| &n.name, |n| &mut n.name)
        }
    }

    #[derive(Default)]
    struct InheritsTagOnly {
        locality: Locality,
    }

    impl Mapped for InheritsTagOnly {
        fn descriptor() -> TypeDescriptor<Self> {
            TypeDescriptor::new("InheritsTagOnly").extends(
                Locality::descriptor().lift(|c: &InheritsTagOnly| &c.locality, |c| &mut c.locality),
            )
        }
    }

    #[test]
    fn derived_fields_come_before_ancestors() {
        let schema = extract_schema::<City>().unwrap();
        let columns: Vec<_> = schema.fields.iter().map(|f| f.column_name.as_str()).collect();
        assert_eq!(columns, ["is_megapolis", "city_name", "country", "population"]);
        assert_eq!(schema.table_name, "Cities");
    }

    #[test]
    fn unmapped_fields_are_dropped_silently() {
        let schema = extract_schema::<City>().unwrap();
        assert!(schema.field_by_member("aliases").is_none());
        assert_eq!(schema.fields[0].storage, StorageType::Boolean);
    }

    #[test]
    fn key_fields_keep_schema_order() {
        let schema = extract_schema::<City>().unwrap();
        let keys: Vec<_> = schema.key_fields.iter().map(|f| f.member_name).collect();
        assert_eq!(keys, ["cityName", "country"]);
        assert_eq!(schema.non_key_fields().count(), 2);
    }

    #[test]
    fn inherited_accessors_reach_the_embedded_value() {
        let schema = extract_schema::<City>().unwrap();
        let mut city = City::default();
        let population = schema.field_by_member("population").unwrap();
        population
            .set(&mut city, crate::libs::value::Value::Integer(16_000_000))
            .unwrap();
        assert_eq!(city.locality.population, 16_000_000);
        assert_eq!(
            population.get(&city),
            crate::libs::value::Value::Integer(16_000_000)
        );
        assert!(city.aliases.is_empty());
    }

    #[test]
    fn missing_tag_is_reported() {
        assert_eq!(
            extract_schema::<Untagged>().unwrap_err(),
            ConfigurationError::NoTableTag { type_name: "Untagged" }
        );
        assert_eq!(Untagged::default().id, 0);
    }

    #[test]
    fn ancestor_tag_does_not_count() {
        assert_eq!(
            extract_schema::<InheritsTagOnly>().unwrap_err(),
            ConfigurationError::NoTableTag {
                type_name: "InheritsTagOnly"
            }
        );
    }

    #[test]
    fn missing_keys_are_reported() {
        assert_eq!(
            extract_schema::<Keyless>().unwrap_err(),
            ConfigurationError::NoKeyFields { type_name: "Keyless" }
        );
    }

    #[test]
    fn tag_is_checked_before_keys() {
        assert!(matches!(
            extract_schema::<Neither>(),
            Err(ConfigurationError::NoTableTag { .. })
        ));
    }
}
