//! In-memory entity store.
//!
//! Every entity kind lives in its own table with its own id sequence, so
//! BaseDesign 1 and DesignProject 1 can coexist. Tables are ordered by id,
//! which is also insertion order.
//!
//! Mutations of a project go through [`EntityStore::modify_project`], which
//! runs the whole read-modify-write under the table's write lock. Appending an
//! iteration or a chat exchange therefore never loses a concurrent append.
//! No lock is ever held across an await point.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use tracing::debug;
use ulid::{Generator, Ulid};

use crate::{
    catalog, BaseDesign, ChatMessage, CurrentDesignData, DesignIteration, DesignProject,
    EntityKind, ManufacturingOrder, NewBaseDesign, NewOrder, NewProject, NewSubDesign, OrderPatch,
    ProjectPatch, ProjectStatus, StoreError, SubDesign,
};

struct Table<T> {
    next_id: u64,
    rows: BTreeMap<u64, T>,
}

impl<T: Clone> Table<T> {
    fn new() -> Self {
        Self {
            next_id: 1,
            rows: BTreeMap::new(),
        }
    }

    fn insert_with(&mut self, build: impl FnOnce(u64) -> T) -> T {
        let id = self.next_id;
        self.next_id += 1;
        let row = build(id);
        self.rows.insert(id, row.clone());
        row
    }

    fn get(&self, id: u64) -> Option<T> {
        self.rows.get(&id).cloned()
    }

    fn all(&self) -> Vec<T> {
        self.rows.values().cloned().collect()
    }
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

pub struct EntityStore {
    base_designs: RwLock<Table<BaseDesign>>,
    sub_designs: RwLock<Table<SubDesign>>,
    projects: RwLock<Table<DesignProject>>,
    orders: RwLock<Table<ManufacturingOrder>>,
    record_ids: Mutex<Generator>,
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityStore {
    /// An empty store with no catalog.
    pub fn new() -> Self {
        Self {
            base_designs: RwLock::new(Table::new()),
            sub_designs: RwLock::new(Table::new()),
            projects: RwLock::new(Table::new()),
            orders: RwLock::new(Table::new()),
            record_ids: Mutex::new(Generator::new()),
        }
    }

    /// A store preloaded with the base and sub design catalog.
    pub fn seeded() -> Self {
        let store = Self::new();
        for design in catalog::base_designs() {
            store.create_base_design(design);
        }
        for design in catalog::sub_designs() {
            store.create_sub_design(design);
        }
        debug!(
            base_designs = read(&store.base_designs).rows.len(),
            sub_designs = read(&store.sub_designs).rows.len(),
            "catalog seeded"
        );
        store
    }

    /// Fresh id for an iteration or chat message. Monotonic within the process.
    pub fn next_record_id(&self) -> String {
        let mut generator = self
            .record_ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        generator
            .generate()
            .unwrap_or_else(|_| Ulid::new())
            .to_string()
    }

    // --- Base designs ---

    pub fn create_base_design(&self, draft: NewBaseDesign) -> BaseDesign {
        write(&self.base_designs).insert_with(|id| BaseDesign {
            id,
            name: draft.name,
            category: draft.category,
            description: draft.description,
            image_url: draft.image_url,
            specifications: draft.specifications,
        })
    }

    pub fn base_designs(&self) -> Vec<BaseDesign> {
        read(&self.base_designs).all()
    }

    /// Exact, case-sensitive match on the category name.
    pub fn base_designs_by_category(&self, category: &str) -> Vec<BaseDesign> {
        read(&self.base_designs)
            .rows
            .values()
            .filter(|d| d.category.as_str() == category)
            .cloned()
            .collect()
    }

    pub fn base_design(&self, id: u64) -> Option<BaseDesign> {
        read(&self.base_designs).get(id)
    }

    // --- Sub designs ---

    pub fn create_sub_design(&self, draft: NewSubDesign) -> SubDesign {
        write(&self.sub_designs).insert_with(|id| SubDesign {
            id,
            name: draft.name,
            kind: draft.kind,
            description: draft.description,
            icon_name: draft.icon_name,
        })
    }

    pub fn sub_designs(&self) -> Vec<SubDesign> {
        read(&self.sub_designs).all()
    }

    pub fn sub_design(&self, id: u64) -> Option<SubDesign> {
        read(&self.sub_designs).get(id)
    }

    // --- Projects ---

    pub fn create_project(&self, draft: NewProject) -> DesignProject {
        let now = Utc::now();
        let project = write(&self.projects).insert_with(|id| DesignProject {
            id,
            name: draft.name,
            base_design_id: draft.base_design_id,
            current_design_data: draft.current_design_data,
            chat_history: draft.chat_history,
            design_iterations: draft.design_iterations,
            selected_sub_designs: draft.selected_sub_designs,
            status: draft.status,
            created_at: now,
            updated_at: now,
        });
        debug!(project_id = project.id, "project created");
        project
    }

    pub fn projects(&self) -> Vec<DesignProject> {
        read(&self.projects).all()
    }

    pub fn project(&self, id: u64) -> Option<DesignProject> {
        read(&self.projects).get(id)
    }

    /// Apply `f` to the stored project atomically and refresh `updatedAt`.
    pub fn modify_project(
        &self,
        id: u64,
        f: impl FnOnce(&mut DesignProject),
    ) -> Result<DesignProject, StoreError> {
        let mut table = write(&self.projects);
        let project = table.rows.get_mut(&id).ok_or(StoreError::NotFound {
            kind: EntityKind::Project,
            id,
        })?;
        f(project);
        project.updated_at = Utc::now().max(project.updated_at);
        Ok(project.clone())
    }

    /// Shallow merge of `patch` over the stored project.
    pub fn update_project(&self, id: u64, patch: ProjectPatch) -> Result<DesignProject, StoreError> {
        self.modify_project(id, |project| patch.apply(project))
    }

    /// Append one iteration and make it the current design. Specifications on
    /// the current design are carried over.
    pub fn append_iteration(
        &self,
        id: u64,
        iteration: DesignIteration,
    ) -> Result<DesignProject, StoreError> {
        self.modify_project(id, |project| {
            let specifications = project
                .current_design_data
                .take()
                .and_then(|data| data.specifications);
            project.current_design_data = Some(CurrentDesignData {
                image_url: iteration.image_url.clone(),
                prompt: iteration.prompt.clone(),
                specifications,
            });
            project.design_iterations.push(iteration);
        })
    }

    /// Append a user turn followed by the assistant turn.
    pub fn append_chat_turns(
        &self,
        id: u64,
        user: ChatMessage,
        assistant: ChatMessage,
    ) -> Result<DesignProject, StoreError> {
        self.modify_project(id, |project| {
            project.chat_history.push(user);
            project.chat_history.push(assistant);
        })
    }

    pub fn set_project_status(
        &self,
        id: u64,
        status: ProjectStatus,
    ) -> Result<DesignProject, StoreError> {
        self.modify_project(id, |project| project.status = status)
    }

    // --- Manufacturing orders ---

    pub fn create_order(&self, draft: NewOrder) -> ManufacturingOrder {
        write(&self.orders).insert_with(|id| ManufacturingOrder {
            id,
            project_id: draft.project_id,
            specifications: draft.specifications,
            status: draft.status,
            created_at: Utc::now(),
        })
    }

    pub fn orders(&self) -> Vec<ManufacturingOrder> {
        read(&self.orders).all()
    }

    pub fn order(&self, id: u64) -> Option<ManufacturingOrder> {
        read(&self.orders).get(id)
    }

    pub fn update_order(&self, id: u64, patch: OrderPatch) -> Result<ManufacturingOrder, StoreError> {
        let mut table = write(&self.orders);
        let order = table.rows.get_mut(&id).ok_or(StoreError::NotFound {
            kind: EntityKind::Order,
            id,
        })?;
        if let Some(status) = patch.status {
            order.status = status;
        }
        if let Some(specifications) = patch.specifications {
            order.specifications = specifications;
        }
        Ok(order.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Category, OrderSpecifications, OrderStatus};
    use std::sync::Arc;

    fn draft(name: &str) -> NewProject {
        NewProject {
            name: name.to_string(),
            base_design_id: Some(1),
            ..NewProject::default()
        }
    }

    fn iteration(store: &EntityStore, prompt: &str) -> DesignIteration {
        DesignIteration {
            id: store.next_record_id(),
            image_url: "/uploads/x.png".to_string(),
            prompt: prompt.to_string(),
            timestamp: Utc::now(),
            ai_response: String::new(),
        }
    }

    #[test]
    fn seeded_catalog_starts_at_classic_solitaire() {
        let store = EntityStore::seeded();
        let first = store.base_design(1).unwrap();
        assert_eq!(first.name, "Classic Solitaire");
        assert_eq!(first.category, Category::Rings);
        assert_eq!(store.base_designs().len(), 6);
        assert_eq!(store.sub_designs().len(), 6);
        assert_eq!(store.sub_design(1).unwrap().name, "Diamond Accent");
    }

    #[test]
    fn ids_are_scoped_per_kind() {
        let store = EntityStore::seeded();
        let project = store.create_project(draft("Custom Classic Solitaire"));
        assert_eq!(project.id, 1);
        assert_eq!(project.status, ProjectStatus::Draft);
        assert_eq!(project.created_at, project.updated_at);
    }

    #[test]
    fn category_filter_is_exact() {
        let store = EntityStore::seeded();
        let rings = store.base_designs_by_category("rings");
        assert_eq!(
            rings.iter().map(|d| d.name.as_str()).collect::<Vec<_>>(),
            vec!["Classic Solitaire", "Art Deco Luxury"]
        );
        assert!(store.base_designs_by_category("Rings").is_empty());
        assert!(store.base_designs_by_category("brooches").is_empty());
    }

    #[test]
    fn update_unknown_project_is_not_found() {
        let store = EntityStore::new();
        let err = store.update_project(42, ProjectPatch::default()).unwrap_err();
        assert!(matches!(
            err,
            StoreError::NotFound {
                kind: EntityKind::Project,
                id: 42
            }
        ));
    }

    #[test]
    fn update_refreshes_updated_at_and_replaces_lists() {
        let store = EntityStore::new();
        let project = store.create_project(draft("p"));
        store.append_iteration(project.id, iteration(&store, "one")).unwrap();
        store.append_iteration(project.id, iteration(&store, "two")).unwrap();

        let patch = ProjectPatch {
            design_iterations: Some(vec![iteration(&store, "only")]),
            ..ProjectPatch::default()
        };
        let updated = store.update_project(project.id, patch).unwrap();
        assert_eq!(updated.design_iterations.len(), 1);
        assert_eq!(updated.design_iterations[0].prompt, "only");
        assert!(updated.updated_at >= project.updated_at);
        assert_eq!(updated.created_at, project.created_at);
    }

    #[test]
    fn append_iteration_refreshes_current_design_and_keeps_specs() {
        let store = EntityStore::seeded();
        let base = store.base_design(1).unwrap();
        let project = store.create_project(NewProject {
            current_design_data: Some(CurrentDesignData {
                image_url: base.image_url.clone(),
                prompt: "Base design: Classic Solitaire".to_string(),
                specifications: base.specifications.clone(),
            }),
            ..draft("p")
        });
        let updated = store
            .append_iteration(project.id, iteration(&store, "make it bigger"))
            .unwrap();
        let current = updated.current_design_data.unwrap();
        assert_eq!(current.prompt, "make it bigger");
        assert_eq!(current.image_url, "/uploads/x.png");
        assert_eq!(current.specifications, base.specifications);
    }

    #[test]
    fn concurrent_appends_lose_nothing() {
        let store = Arc::new(EntityStore::new());
        let project = store.create_project(draft("p"));
        std::thread::scope(|scope| {
            for worker in 0..8 {
                let store = Arc::clone(&store);
                scope.spawn(move || {
                    for n in 0..25 {
                        let it = iteration(&store, &format!("{worker}-{n}"));
                        store.append_iteration(project.id, it).unwrap();
                    }
                });
            }
        });
        let project = store.project(project.id).unwrap();
        assert_eq!(project.design_iterations.len(), 200);
    }

    #[test]
    fn sequential_appends_keep_call_order() {
        let store = EntityStore::new();
        let project = store.create_project(draft("p"));
        let prompts: Vec<String> = (0..20).map(|n| format!("step {n}")).collect();
        for prompt in &prompts {
            store
                .append_iteration(project.id, iteration(&store, prompt))
                .unwrap();
        }
        let project = store.project(project.id).unwrap();
        let recorded: Vec<_> = project
            .design_iterations
            .iter()
            .map(|i| i.prompt.clone())
            .collect();
        assert_eq!(recorded, prompts);
        assert_eq!(project.current_design_data.unwrap().prompt, "step 19");
    }

    #[test]
    fn record_ids_are_unique_and_ordered() {
        let store = EntityStore::new();
        let ids: Vec<String> = (0..100).map(|_| store.next_record_id()).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted, ids);
    }

    #[test]
    fn chat_turns_append_in_order() {
        let store = EntityStore::new();
        let project = store.create_project(draft("p"));
        let turn = |content: &str, is_user: bool| ChatMessage {
            id: store.next_record_id(),
            content: content.to_string(),
            is_user,
            timestamp: Utc::now(),
            image_url: None,
        };
        let updated = store
            .append_chat_turns(project.id, turn("hi", true), turn("hello", false))
            .unwrap();
        assert_eq!(updated.chat_history.len(), 2);
        assert!(updated.chat_history[0].is_user);
        assert!(!updated.chat_history[1].is_user);
    }

    #[test]
    fn orders_can_be_advanced() {
        let store = EntityStore::new();
        let order = store.create_order(NewOrder {
            project_id: 1,
            specifications: OrderSpecifications {
                materials: vec!["Gold".to_string()],
                dimensions: Default::default(),
                weight: "5g".to_string(),
                finish: "High Polish".to_string(),
                timeline: "3-4 weeks".to_string(),
                price: 1500.0,
            },
            status: OrderStatus::Pending,
        });
        assert_eq!(order.id, 1);
        let advanced = store
            .update_order(
                order.id,
                OrderPatch {
                    status: Some(OrderStatus::Approved),
                    ..OrderPatch::default()
                },
            )
            .unwrap();
        assert_eq!(advanced.status, OrderStatus::Approved);
        assert!(store.update_order(9, OrderPatch::default()).is_err());
        assert_eq!(store.orders().len(), 1);
    }
}
