//! Content store with file-based JSON persistence
//!
//! Directory layout:
//! ```text
//! <base>/content/
//! ├── boxes/box-<uuid>.json
//! ├── experiments/exp-<uuid>.json
//! ├── tasks/task-<uuid>.json
//! └── documents/doc-<uuid>.json
//! ```
//!
//! Each kind lives in its own [`Collection`]. Writes are persisted before
//! they become visible, so a failed write leaves the previous version in
//! place. Writes that check references across collections (experiment
//! create/replace, box and task delete) run one at a time.

use crate::content::types::*;
use crate::content::validate;
use crate::error::{Error, Result};
use crate::storage::{self, new_id};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::{Mutex, RwLock};

/// Behavior shared by every content entity kind
pub trait ContentItem: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Human-readable kind name used in messages and logs
    const KIND: &'static str;

    fn id(&self) -> &str;
    fn status(&self) -> ContentStatus;
    fn created_at(&self) -> DateTime<Utc>;
    fn set_status(&mut self, status: ContentStatus, now: DateTime<Utc>);

    /// The collection holding this kind inside a [`ContentStore`]
    fn collection(store: &ContentStore) -> &Collection<Self>;
}

macro_rules! content_item {
    ($ty:ty, $kind:literal, $field:ident) => {
        impl ContentItem for $ty {
            const KIND: &'static str = $kind;

            fn id(&self) -> &str {
                &self.id
            }

            fn status(&self) -> ContentStatus {
                self.status
            }

            fn created_at(&self) -> DateTime<Utc> {
                self.created_at
            }

            fn set_status(&mut self, status: ContentStatus, now: DateTime<Utc>) {
                self.status = status;
                self.updated_at = now;
            }

            fn collection(store: &ContentStore) -> &Collection<Self> {
                &store.$field
            }
        }
    };
}

content_item!(ExperimentBox, "Box", boxes);
content_item!(Experiment, "Experiment", experiments);
content_item!(Task, "Task", tasks);
content_item!(Document, "Document", documents);

/// Kind-specific create/replace/delete, so admin handlers can be generic
#[async_trait]
pub trait Authoring: ContentItem {
    /// Create/replace request body
    type Input: DeserializeOwned + Send + 'static;

    async fn create(store: &ContentStore, input: Self::Input) -> Result<Self>;
    async fn replace(store: &ContentStore, id: &str, input: Self::Input) -> Result<Self>;
    async fn delete(store: &ContentStore, id: &str) -> Result<Self>;
}

macro_rules! authoring {
    ($ty:ty, $input:ty, $create:ident, $update:ident, $delete:ident) => {
        #[async_trait]
        impl Authoring for $ty {
            type Input = $input;

            async fn create(store: &ContentStore, input: $input) -> Result<Self> {
                store.$create(input).await
            }

            async fn replace(store: &ContentStore, id: &str, input: $input) -> Result<Self> {
                store.$update(id, input).await
            }

            async fn delete(store: &ContentStore, id: &str) -> Result<Self> {
                store.$delete(id).await
            }
        }
    };
}

authoring!(ExperimentBox, BoxInput, create_box, update_box, delete_box);
authoring!(Experiment, ExperimentInput, create_experiment, update_experiment, delete_experiment);
authoring!(Task, TaskInput, create_task, update_task, delete_task);
authoring!(Document, DocumentInput, create_document, update_document, delete_document);

// =============================================================================
// Collection
// =============================================================================

/// In-memory map of one entity kind backed by a directory of JSON files
pub struct Collection<T> {
    dir: PathBuf,
    items: RwLock<HashMap<String, T>>,
}

impl<T: ContentItem> Collection<T> {
    async fn open(dir: PathBuf) -> Result<Self> {
        tokio::fs::create_dir_all(&dir).await?;
        let items = storage::load_json_files::<T>(&dir)
            .into_iter()
            .map(|item| (item.id().to_string(), item))
            .collect();
        Ok(Self {
            dir,
            items: RwLock::new(items),
        })
    }

    /// All items, oldest first, optionally restricted to one status
    pub async fn list(&self, status: Option<ContentStatus>) -> Vec<T> {
        let items = self.items.read().await;
        let mut list: Vec<T> = items
            .values()
            .filter(|item| status.map_or(true, |s| item.status() == s))
            .cloned()
            .collect();
        list.sort_by(|a, b| {
            a.created_at()
                .cmp(&b.created_at())
                .then_with(|| a.id().cmp(b.id()))
        });
        list
    }

    pub async fn get(&self, id: &str) -> Option<T> {
        self.items.read().await.get(id).cloned()
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.items.read().await.contains_key(id)
    }

    /// Find the first item matching a predicate
    pub async fn find(&self, predicate: impl Fn(&T) -> bool) -> Option<T> {
        self.items.read().await.values().find(|i| predicate(i)).cloned()
    }

    /// Insert a new item after `check` approves it against the current items
    async fn insert_with(
        &self,
        item: T,
        check: impl FnOnce(&HashMap<String, T>) -> Result<()>,
    ) -> Result<T> {
        let mut items = self.items.write().await;
        check(&items)?;
        storage::write_json(&self.dir, item.id(), &item).await?;
        items.insert(item.id().to_string(), item.clone());
        Ok(item)
    }

    /// Apply `apply` to a copy of the item and commit it once persisted
    async fn update_with(
        &self,
        id: &str,
        apply: impl FnOnce(&mut T, &HashMap<String, T>) -> Result<()>,
    ) -> Result<T> {
        let mut items = self.items.write().await;
        let mut next = items
            .get(id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("{} '{}' not found", T::KIND, id)))?;
        apply(&mut next, &items)?;
        storage::write_json(&self.dir, id, &next).await?;
        items.insert(id.to_string(), next.clone());
        Ok(next)
    }

    async fn remove(&self, id: &str) -> Result<T> {
        let mut items = self.items.write().await;
        if !items.contains_key(id) {
            return Err(Error::NotFound(format!("{} '{}' not found", T::KIND, id)));
        }
        storage::remove_json(&self.dir, id).await?;
        items
            .remove(id)
            .ok_or_else(|| Error::Internal(format!("{} '{}' vanished", T::KIND, id)))
    }
}

// =============================================================================
// ContentStore
// =============================================================================

/// Boxes, experiments, tasks and documents
pub struct ContentStore {
    boxes: Collection<ExperimentBox>,
    experiments: Collection<Experiment>,
    tasks: Collection<Task>,
    documents: Collection<Document>,
    /// Held across reference checks and the write they guard
    references: Mutex<()>,
}

impl ContentStore {
    /// Open (or create) the content store under `base_dir`
    pub async fn new(base_dir: PathBuf) -> Result<Self> {
        let store = Self {
            boxes: Collection::open(base_dir.join("boxes")).await?,
            experiments: Collection::open(base_dir.join("experiments")).await?,
            tasks: Collection::open(base_dir.join("tasks")).await?,
            documents: Collection::open(base_dir.join("documents")).await?,
            references: Mutex::new(()),
        };
        let boxes = store.boxes.items.read().await.len();
        let experiments = store.experiments.items.read().await.len();
        let tasks = store.tasks.items.read().await.len();
        let documents = store.documents.items.read().await.len();
        tracing::info!(
            boxes,
            experiments,
            tasks,
            documents,
            "Content store loaded from {}",
            base_dir.display()
        );
        Ok(store)
    }

    pub fn collection<T: ContentItem>(&self) -> &Collection<T> {
        T::collection(self)
    }

    // =========================================================================
    // Generic reads and publish workflow
    // =========================================================================

    pub async fn list<T: ContentItem>(&self, status: Option<ContentStatus>) -> Vec<T> {
        self.collection::<T>().list(status).await
    }

    pub async fn get<T: ContentItem>(&self, id: &str) -> Option<T> {
        self.collection::<T>().get(id).await
    }

    /// Get an item that must be published; drafts look missing
    pub async fn get_published<T: ContentItem>(&self, id: &str) -> Result<T> {
        self.get::<T>(id)
            .await
            .filter(|item| item.status() == ContentStatus::Published)
            .ok_or_else(|| Error::NotFound(format!("{} '{}' not found", T::KIND, id)))
    }

    /// Publish or unpublish an item in place
    pub async fn set_status<T: ContentItem>(&self, id: &str, status: ContentStatus) -> Result<T> {
        let item = self
            .collection::<T>()
            .update_with(id, |item, _| {
                item.set_status(status, Utc::now());
                Ok(())
            })
            .await?;
        tracing::info!(kind = T::KIND, id = %id, status = %status, "Content status changed");
        Ok(item)
    }

    // =========================================================================
    // Boxes
    // =========================================================================

    pub async fn create_box(&self, input: BoxInput) -> Result<ExperimentBox> {
        validate::validate_box(&input)?;
        let now = Utc::now();
        let item = ExperimentBox {
            id: new_id("box"),
            name: input.name,
            description: input.description,
            icon: input.icon,
            thumbnail: input.thumbnail,
            status: ContentStatus::Draft,
            created_at: now,
            updated_at: now,
        };
        self.boxes.insert_with(item, |_| Ok(())).await
    }

    pub async fn update_box(&self, id: &str, input: BoxInput) -> Result<ExperimentBox> {
        validate::validate_box(&input)?;
        self.boxes
            .update_with(id, |item, _| {
                item.name = input.name;
                item.description = input.description;
                item.icon = input.icon;
                item.thumbnail = input.thumbnail;
                item.updated_at = Utc::now();
                Ok(())
            })
            .await
    }

    /// Delete a box; experiments must be moved or deleted first
    pub async fn delete_box(&self, id: &str) -> Result<ExperimentBox> {
        let _guard = self.references.lock().await;
        if let Some(experiment) = self.experiments.find(|e| e.box_id == id).await {
            return Err(Error::Conflict(format!(
                "Box '{}' still contains experiment '{}'",
                id, experiment.id
            )));
        }
        self.boxes.remove(id).await
    }

    /// Published box with its published experiments
    pub async fn box_detail(&self, id: &str) -> Result<BoxDetail> {
        let item = self.get_published::<ExperimentBox>(id).await?;
        let experiments = self
            .experiments
            .list(Some(ContentStatus::Published))
            .await
            .into_iter()
            .filter(|e| e.box_id == item.id)
            .collect();
        Ok(BoxDetail { item, experiments })
    }

    // =========================================================================
    // Experiments
    // =========================================================================

    pub async fn create_experiment(&self, input: ExperimentInput) -> Result<Experiment> {
        let _guard = self.references.lock().await;
        self.check_experiment_refs(&input).await?;
        let now = Utc::now();
        let item = Experiment {
            id: new_id("exp"),
            name: input.name,
            description: input.description,
            box_id: input.box_id,
            overviews: build_overviews(input.overviews),
            days: build_days(input.days),
            status: ContentStatus::Draft,
            created_at: now,
            updated_at: now,
        };
        self.experiments.insert_with(item, |_| Ok(())).await
    }

    /// Replace an experiment's fields, including its day/task ordering
    pub async fn update_experiment(&self, id: &str, input: ExperimentInput) -> Result<Experiment> {
        let _guard = self.references.lock().await;
        self.check_experiment_refs(&input).await?;
        self.experiments
            .update_with(id, |item, _| {
                item.name = input.name;
                item.description = input.description;
                item.box_id = input.box_id;
                item.overviews = build_overviews(input.overviews);
                item.days = build_days(input.days);
                item.updated_at = Utc::now();
                Ok(())
            })
            .await
    }

    pub async fn delete_experiment(&self, id: &str) -> Result<Experiment> {
        self.experiments.remove(id).await
    }

    async fn check_experiment_refs(&self, input: &ExperimentInput) -> Result<()> {
        let mut problems = validate::Problems::default();
        validate::check_name(&mut problems, "name", &input.name);
        if !self.boxes.contains(&input.box_id).await {
            problems.push(format!("box '{}' does not exist", input.box_id));
        }
        if input.days.is_empty() {
            problems.push("days must contain at least one day");
        }
        for (index, day) in input.days.iter().enumerate() {
            for task_id in &day.tasks {
                if !self.tasks.contains(task_id).await {
                    problems.push(format!("days[{}] references unknown task '{}'", index, task_id));
                }
            }
        }
        problems.finish("experiment")
    }

    // =========================================================================
    // Tasks
    // =========================================================================

    pub async fn create_task(&self, input: TaskInput) -> Result<Task> {
        validate::validate_task(&input)?;
        let now = Utc::now();
        let item = Task {
            id: new_id("task"),
            name: input.name,
            icon: input.icon,
            blocks: input.blocks,
            status: ContentStatus::Draft,
            created_at: now,
            updated_at: now,
        };
        self.tasks.insert_with(item, |_| Ok(())).await
    }

    pub async fn update_task(&self, id: &str, input: TaskInput) -> Result<Task> {
        validate::validate_task(&input)?;
        self.tasks
            .update_with(id, |item, _| {
                item.name = input.name;
                item.icon = input.icon;
                item.blocks = input.blocks;
                item.updated_at = Utc::now();
                Ok(())
            })
            .await
    }

    /// Delete a task; it must not be scheduled on any experiment day
    pub async fn delete_task(&self, id: &str) -> Result<Task> {
        let _guard = self.references.lock().await;
        if let Some(experiment) = self.experiments.find(|e| e.references_task(id)).await {
            return Err(Error::Conflict(format!(
                "Task '{}' is scheduled in experiment '{}'",
                id, experiment.id
            )));
        }
        self.tasks.remove(id).await
    }

    // =========================================================================
    // Documents
    // =========================================================================

    pub async fn create_document(&self, input: DocumentInput) -> Result<Document> {
        validate::validate_document(&input)?;
        let now = Utc::now();
        let item = Document {
            id: new_id("doc"),
            slug: input.slug,
            title: input.title,
            body: input.body,
            status: ContentStatus::Draft,
            created_at: now,
            updated_at: now,
        };
        let slug = item.slug.clone();
        self.documents
            .insert_with(item, |existing| check_slug_free(existing, None, &slug))
            .await
    }

    pub async fn update_document(&self, id: &str, input: DocumentInput) -> Result<Document> {
        validate::validate_document(&input)?;
        self.documents
            .update_with(id, |item, existing| {
                check_slug_free(existing, Some(id), &input.slug)?;
                item.slug = input.slug;
                item.title = input.title;
                item.body = input.body;
                item.updated_at = Utc::now();
                Ok(())
            })
            .await
    }

    pub async fn delete_document(&self, id: &str) -> Result<Document> {
        self.documents.remove(id).await
    }

    /// Published document by slug
    pub async fn document_by_slug(&self, slug: &str) -> Result<Document> {
        self.documents
            .find(|d| d.slug == slug && d.status == ContentStatus::Published)
            .await
            .ok_or_else(|| Error::NotFound(format!("Document '{}' not found", slug)))
    }
}

fn check_slug_free(existing: &HashMap<String, Document>, own_id: Option<&str>, slug: &str) -> Result<()> {
    match existing
        .values()
        .find(|d| d.slug == slug && Some(d.id.as_str()) != own_id)
    {
        Some(other) => Err(Error::Conflict(format!(
            "Slug '{}' is already used by document '{}'",
            slug, other.id
        ))),
        None => Ok(()),
    }
}

fn build_overviews(inputs: Vec<OverviewInput>) -> Vec<Overview> {
    inputs
        .into_iter()
        .map(|o| Overview {
            id: o.id.unwrap_or_else(|| new_id("ovw")),
            title: o.title,
            body: o.body,
        })
        .collect()
}

fn build_days(inputs: Vec<DayInput>) -> Vec<Day> {
    inputs
        .into_iter()
        .map(|d| Day {
            id: d.id.unwrap_or_else(|| new_id("day")),
            tasks: d.tasks,
        })
        .collect()
}
