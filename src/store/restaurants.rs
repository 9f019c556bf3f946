use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::restaurant::Restaurant;

/// Lookup of restaurants by id and by owning user. Each owner holds at most
/// one restaurant.
#[derive(Default)]
pub struct RestaurantDirectory {
    by_id: DashMap<Uuid, Restaurant>,
    by_owner: DashMap<Uuid, Uuid>,
}

impl RestaurantDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Rejects both a reused restaurant id and a second restaurant for the
    /// same owner. The id entry stays locked until the owner slot is filled.
    pub fn register(&self, restaurant: Restaurant) -> Result<(), AppError> {
        let id_slot = match self.by_id.entry(restaurant.id) {
            Entry::Occupied(_) => {
                return Err(AppError::Conflict(format!(
                    "restaurant {} already exists",
                    restaurant.id
                )));
            }
            Entry::Vacant(slot) => slot,
        };

        match self.by_owner.entry(restaurant.owner_id) {
            Entry::Occupied(_) => Err(AppError::Conflict(format!(
                "owner {} already has a restaurant",
                restaurant.owner_id
            ))),
            Entry::Vacant(owner_slot) => {
                owner_slot.insert(restaurant.id);
                id_slot.insert(restaurant);
                Ok(())
            }
        }
    }

    pub fn get(&self, id: Uuid) -> Result<Restaurant, AppError> {
        self.by_id
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| AppError::NotFound(format!("restaurant {id} not found")))
    }

    pub fn find_by_owner(&self, owner_id: Uuid) -> Result<Restaurant, AppError> {
        let id = self
            .by_owner
            .get(&owner_id)
            .map(|entry| *entry.value())
            .ok_or_else(|| AppError::NotFound("restaurant not found".to_string()))?;
        self.get(id)
    }

    pub fn name_of(&self, id: Uuid) -> Option<String> {
        self.by_id.get(&id).map(|entry| entry.value().name.clone())
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn restaurant(owner_id: Uuid) -> Restaurant {
        Restaurant {
            id: Uuid::new_v4(),
            owner_id,
            name: "Mama Put".to_string(),
            delivery_fee: Decimal::from(500),
            minimum_order: Decimal::ZERO,
            is_open: true,
            rating: 4.2,
        }
    }

    #[test]
    fn owner_maps_to_their_restaurant() {
        let directory = RestaurantDirectory::new();
        let owner = Uuid::new_v4();
        let r = restaurant(owner);
        directory.register(r.clone()).unwrap();

        assert_eq!(directory.find_by_owner(owner).unwrap().id, r.id);
        assert!(matches!(
            directory.find_by_owner(Uuid::new_v4()),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn second_restaurant_for_same_owner_is_rejected() {
        let directory = RestaurantDirectory::new();
        let owner = Uuid::new_v4();
        directory.register(restaurant(owner)).unwrap();

        let result = directory.register(restaurant(owner));
        assert!(matches!(result, Err(AppError::Conflict(_))));
        assert_eq!(directory.len(), 1);
    }

    #[test]
    fn reused_restaurant_id_is_rejected() {
        let directory = RestaurantDirectory::new();
        let first_owner = Uuid::new_v4();
        let original = restaurant(first_owner);
        directory.register(original.clone()).unwrap();

        let second_owner = Uuid::new_v4();
        let mut impostor = restaurant(second_owner);
        impostor.id = original.id;
        impostor.name = "Impostor Kitchen".to_string();

        let result = directory.register(impostor);
        assert!(matches!(result, Err(AppError::Conflict(_))));
        assert_eq!(directory.len(), 1);
        assert_eq!(directory.get(original.id).unwrap().name, "Mama Put");
        assert_eq!(directory.find_by_owner(first_owner).unwrap().id, original.id);
        assert!(matches!(
            directory.find_by_owner(second_owner),
            Err(AppError::NotFound(_))
        ));
    }
}
