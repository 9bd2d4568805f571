use std::{collections::BTreeMap, future::Future, sync::Arc};

use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;
use tracing::warn;

use crate::{
    application::repos::RepoError,
    presentation::admin::views::{
        ConfirmDialogView, ResourceActionView, ResourceCellView, ResourceHeaderView,
        ResourceModalView, ResourceRowView, ResourceTableView,
    },
};

use super::{
    Resource,
    collection::ResourceCollection,
    fields::{Field, FormValues},
    form::{FormModal, FormMode},
};

pub const MODAL_CLOSE_PATH: &str = "/_modal/close";

/// Failure reported by a page callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceError {
    /// The API rejected individual fields; the modal shows these under each field.
    Fields(BTreeMap<String, String>),
    /// Any other failure. The callback has already raised a notice for it.
    Failed(String),
}

impl From<RepoError> for ResourceError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::FieldErrors(fields) => ResourceError::Fields(fields),
            other => ResourceError::Failed(other.to_string()),
        }
    }
}

impl From<&RepoError> for ResourceError {
    fn from(err: &RepoError) -> Self {
        match err.field_errors() {
            Some(fields) => ResourceError::Fields(fields.clone()),
            None => ResourceError::Failed(err.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Pending,
    Confirmed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Ask the user before deleting; carries the prompt.
    ConfirmationRequired(String),
    Deleted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Client-side validation failed; nothing was sent.
    Invalid,
    /// Another save of the same collection is in flight.
    Ignored,
    Saved,
    /// The API rejected individual fields.
    Rejected,
    Failed,
}

impl SubmitOutcome {
    pub fn closes_modal(self) -> bool {
        matches!(self, SubmitOutcome::Saved)
    }
}

/// URLs for one managed collection, derived from its base path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRoutes {
    base: String,
}

impl ResourceRoutes {
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn create_form(&self) -> String {
        format!("{}/new", self.base)
    }

    pub fn create(&self) -> String {
        self.base.clone()
    }

    pub fn edit_form(&self, id: &str) -> String {
        format!("{}/{id}/edit", self.base)
    }

    pub fn update(&self, id: &str) -> String {
        format!("{}/{id}", self.base)
    }

    pub fn delete(&self, id: &str) -> String {
        format!("{}/{id}/delete", self.base)
    }

    pub fn submit(&self, mode: &FormMode) -> String {
        match mode {
            FormMode::Create => self.create(),
            FormMode::Edit { id } => self.update(id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKey {
    Field(&'static str),
    Actions,
}

pub type CellRenderer<R> = Arc<dyn Fn(&R) -> ResourceCellView + Send + Sync>;

pub struct Column<R> {
    key: ColumnKey,
    header: &'static str,
    render: Option<CellRenderer<R>>,
    class: Option<&'static str>,
}

impl<R> Clone for Column<R> {
    fn clone(&self) -> Self {
        Self {
            key: self.key,
            header: self.header,
            render: self.render.clone(),
            class: self.class,
        }
    }
}

impl<R: Resource> Column<R> {
    pub fn field(key: &'static str, header: &'static str) -> Self {
        Self {
            key: ColumnKey::Field(key),
            header,
            render: None,
            class: None,
        }
    }

    pub fn actions(header: &'static str) -> Self {
        Self {
            key: ColumnKey::Actions,
            header,
            render: None,
            class: None,
        }
    }

    pub fn render<F>(mut self, render: F) -> Self
    where
        F: Fn(&R) -> ResourceCellView + Send + Sync + 'static,
    {
        self.render = Some(Arc::new(render));
        self
    }

    pub fn class(mut self, class: &'static str) -> Self {
        self.class = Some(class);
        self
    }

    pub fn key(&self) -> ColumnKey {
        self.key
    }
}

type ResourceFuture<T> = BoxFuture<'static, Result<T, ResourceError>>;
type CreateCallback = Arc<dyn Fn(FormValues) -> ResourceFuture<()> + Send + Sync>;
type EditCallback = Arc<dyn Fn(String, FormValues) -> ResourceFuture<()> + Send + Sync>;
type DeleteCallback =
    Arc<dyn Fn(String, Confirmation) -> ResourceFuture<DeleteOutcome> + Send + Sync>;
type FieldsBuilder = Arc<dyn Fn(&FormMode) -> Vec<Field> + Send + Sync>;

pub struct ResourceManager<R> {
    key: &'static str,
    title: String,
    routes: ResourceRoutes,
    columns: Vec<Column<R>>,
    fields: FieldsBuilder,
    on_create: Option<CreateCallback>,
    on_edit: Option<EditCallback>,
    on_delete: Option<DeleteCallback>,
    collection: Arc<ResourceCollection<R>>,
}

impl<R: Resource> ResourceManager<R> {
    pub fn new(
        key: &'static str,
        title: impl Into<String>,
        routes: ResourceRoutes,
        collection: Arc<ResourceCollection<R>>,
    ) -> Self {
        Self {
            key,
            title: title.into(),
            routes,
            columns: Vec::new(),
            fields: Arc::new(|_| Vec::new()),
            on_create: None,
            on_edit: None,
            on_delete: None,
            collection,
        }
    }

    pub fn columns(mut self, columns: Vec<Column<R>>) -> Self {
        self.columns = columns;
        self
    }

    pub fn fields(mut self, fields: Vec<Field>) -> Self {
        self.fields = Arc::new(move |_| fields.clone());
        self
    }

    /// Fields that differ between the create and edit forms.
    pub fn fields_with<F>(mut self, build: F) -> Self
    where
        F: Fn(&FormMode) -> Vec<Field> + Send + Sync + 'static,
    {
        self.fields = Arc::new(build);
        self
    }

    pub fn on_create<F, Fut>(mut self, callback: F) -> Self
    where
        F: Fn(FormValues) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), ResourceError>> + Send + 'static,
    {
        self.on_create = Some(Arc::new(move |values| callback(values).boxed()));
        self
    }

    pub fn on_edit<F, Fut>(mut self, callback: F) -> Self
    where
        F: Fn(String, FormValues) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), ResourceError>> + Send + 'static,
    {
        self.on_edit = Some(Arc::new(move |id, values| callback(id, values).boxed()));
        self
    }

    pub fn on_delete<F, Fut>(mut self, callback: F) -> Self
    where
        F: Fn(String, Confirmation) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<DeleteOutcome, ResourceError>> + Send + 'static,
    {
        self.on_delete = Some(Arc::new(move |id, confirmation| {
            callback(id, confirmation).boxed()
        }));
        self
    }

    pub fn key(&self) -> &'static str {
        self.key
    }

    pub fn routes(&self) -> &ResourceRoutes {
        &self.routes
    }

    pub fn collection(&self) -> &Arc<ResourceCollection<R>> {
        &self.collection
    }

    pub fn fields_for(&self, mode: &FormMode) -> Vec<Field> {
        (self.fields)(mode)
    }

    pub fn can_create(&self) -> bool {
        self.on_create.is_some() && !self.fields_for(&FormMode::Create).is_empty()
    }

    pub fn table_view(&self) -> ResourceTableView {
        let is_loading = self.collection.is_loading();
        let is_saving = self.collection.is_saving();
        let title_lower = self.title.to_lowercase();
        let can_create = self.can_create();

        let headers = self
            .columns
            .iter()
            .map(|column| ResourceHeaderView {
                label: column.header.to_string(),
                class: column.class.map(str::to_string),
            })
            .collect();

        let rows = if is_loading {
            Vec::new()
        } else {
            self.collection
                .snapshot()
                .iter()
                .map(|item| self.row_view(item, is_saving))
                .collect()
        };

        ResourceTableView {
            key: self.key.to_string(),
            title: self.title.clone(),
            create_action: can_create.then(|| self.routes.create_form()),
            create_disabled: is_loading || is_saving,
            is_loading,
            loading_message: format!("Loading {title_lower}..."),
            empty_message: format!("There are no registered {title_lower}."),
            empty_hint: can_create.then(|| "Click \"+ Add\" to create a new one.".to_string()),
            headers,
            rows,
        }
    }

    fn row_view(&self, item: &R, is_saving: bool) -> ResourceRowView {
        let json = serde_json::to_value(item).unwrap_or(Value::Null);
        let cells = self
            .columns
            .iter()
            .map(|column| {
                let cell = match (&column.render, column.key) {
                    (Some(render), _) => render(item),
                    (None, ColumnKey::Actions) => self.actions_cell(item.id(), is_saving),
                    (None, ColumnKey::Field(name)) => {
                        ResourceCellView::text(cell_text(json.get(name)))
                    }
                };
                if cell.class.is_none()
                    && let Some(class) = column.class
                {
                    cell.with_class(class)
                } else {
                    cell
                }
            })
            .collect();

        ResourceRowView {
            id: item.id().to_string(),
            cells,
        }
    }

    fn actions_cell(&self, id: &str, is_saving: bool) -> ResourceCellView {
        let mut actions = Vec::new();
        if self.on_edit.is_some() {
            actions.push(ResourceActionView {
                label: "Edit",
                action: self.routes.edit_form(id),
                method: "get",
                is_danger: false,
            });
        }
        if self.on_delete.is_some() && !is_saving {
            actions.push(ResourceActionView {
                label: "Delete",
                action: self.routes.delete(id),
                method: "post",
                is_danger: true,
            });
        }
        ResourceCellView {
            text: String::new(),
            class: Some("actions".to_string()),
            actions,
        }
    }

    /// The empty create form, when creation is available.
    pub fn open_create(&self) -> Option<FormModal> {
        if !self.can_create() {
            return None;
        }
        Some(FormModal::create(self.fields_for(&FormMode::Create)))
    }

    /// An edit form seeded from the stored item; `None` for unknown ids.
    pub fn open_edit(&self, id: &str) -> Option<FormModal> {
        self.on_edit.as_ref()?;
        let item = self.collection.find(id)?;
        let json = serde_json::to_value(&item).unwrap_or(Value::Null);
        let mode = FormMode::Edit { id: id.to_string() };
        Some(FormModal::edit(id, &json, self.fields_for(&mode)))
    }

    pub fn modal_view(&self, modal: &FormModal) -> ResourceModalView {
        modal.view(
            self.routes.submit(modal.mode()),
            MODAL_CLOSE_PATH.to_string(),
            self.collection.is_saving(),
        )
    }

    /// Validate a submission and hand it to the create or edit callback.
    pub async fn submit(&self, modal: &mut FormModal, pairs: &[(String, String)]) -> SubmitOutcome {
        let values = FormValues::from_pairs(modal.fields(), pairs);
        if !modal.accept(values) {
            return SubmitOutcome::Invalid;
        }

        let Some(_guard) = self.collection.try_begin_save() else {
            warn!(
                target = "quire::application::resource",
                resource = self.key,
                "save ignored while another save is in flight"
            );
            return SubmitOutcome::Ignored;
        };

        let values = modal.values().clone();
        let result = match (modal.mode().clone(), &self.on_create, &self.on_edit) {
            (FormMode::Create, Some(create), _) => create(values).await,
            (FormMode::Edit { id }, _, Some(edit)) => edit(id, values).await,
            _ => return SubmitOutcome::Ignored,
        };

        match result {
            Ok(()) => SubmitOutcome::Saved,
            Err(ResourceError::Fields(fields)) => {
                modal.attach_server_errors(&fields);
                SubmitOutcome::Rejected
            }
            Err(ResourceError::Failed(_)) => SubmitOutcome::Failed,
        }
    }

    /// Run the delete callback. `None` when deletion is not offered.
    pub async fn delete(
        &self,
        id: &str,
        confirmation: Confirmation,
    ) -> Option<Result<DeleteOutcome, ResourceError>> {
        let delete = self.on_delete.as_ref()?;
        Some(delete(id.to_string(), confirmation).await)
    }

    pub fn confirm_view(&self, id: &str, prompt: String) -> ConfirmDialogView {
        ConfirmDialogView {
            title: "Please confirm".to_string(),
            message: prompt,
            confirm_action: self.routes.delete(id),
            confirm_label: "Delete".to_string(),
            close_action: MODAL_CLOSE_PATH.to_string(),
        }
    }
}

fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| cell_text(Some(item)))
            .collect::<Vec<_>>()
            .join(","),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use regex::Regex;
    use serde::Serialize;

    use super::super::fields::{FieldKind, FieldRules};
    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize)]
    struct Tag {
        id: String,
        name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        aliases: Option<Vec<String>>,
    }

    impl Resource for Tag {
        fn id(&self) -> &str {
            &self.id
        }
    }

    fn tag(id: &str, name: &str) -> Tag {
        Tag {
            id: id.into(),
            name: name.into(),
            aliases: None,
        }
    }

    fn loaded(items: Vec<Tag>) -> Arc<ResourceCollection<Tag>> {
        let collection = Arc::new(ResourceCollection::new());
        let ticket = collection.begin_load();
        collection.finish_load(ticket, items);
        collection
    }

    fn key_field() -> Field {
        Field::new("name", "Permission key", FieldKind::Text).rules(
            FieldRules::default()
                .required()
                .pattern(Regex::new(r"^[A-Z0-9_:]+$").expect("regex")),
        )
    }

    fn pairs(entries: &[(&str, &str)]) -> Vec<(String, String)> {
        entries
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn empty_collections_show_the_empty_state() {
        let manager = ResourceManager::new(
            "tags",
            "Tags",
            ResourceRoutes::new("/tags"),
            loaded(Vec::new()),
        )
        .columns(vec![Column::field("name", "Name")])
        .fields(vec![key_field()]);

        let view = manager.table_view();
        assert!(!view.is_loading);
        assert!(view.is_empty());
        assert_eq!(view.empty_message, "There are no registered tags.");
        assert!(view.create_action.is_none());
        assert!(view.empty_hint.is_none());

        let manager = manager.on_create(|_| async { Ok(()) });
        let view = manager.table_view();
        assert_eq!(view.create_action.as_deref(), Some("/tags/new"));
        assert_eq!(
            view.empty_hint.as_deref(),
            Some("Click \"+ Add\" to create a new one.")
        );
    }

    #[test]
    fn loading_collections_render_no_rows() {
        let collection = Arc::new(ResourceCollection::new());
        collection.apply_created(tag("1", "a"));
        let manager = ResourceManager::new("tags", "Tags", ResourceRoutes::new("/tags"), collection)
            .columns(vec![Column::field("name", "Name")]);

        let view = manager.table_view();
        assert!(view.is_loading);
        assert!(view.create_disabled);
        assert!(view.rows.is_empty());
        assert_eq!(view.loading_message, "Loading tags...");
    }

    #[test]
    fn cells_use_renderers_defaults_and_actions() {
        let mut aliased = tag("2", "beta");
        aliased.aliases = Some(vec!["b".into(), "bb".into()]);
        let manager = ResourceManager::new(
            "tags",
            "Tags",
            ResourceRoutes::new("/tags"),
            loaded(vec![tag("1", "alpha"), aliased]),
        )
        .columns(vec![
            Column::field("name", "Name").class("strong"),
            Column::field("aliases", "Aliases"),
            Column::field("name", "Shout")
                .render(|item: &Tag| ResourceCellView::badge(item.name.to_uppercase())),
            Column::actions("Actions"),
        ])
        .on_delete(|_, _| async { Ok(DeleteOutcome::Deleted) });

        let view = manager.table_view();
        assert_eq!(view.rows.len(), 2);
        let second = &view.rows[1];
        assert_eq!(second.cells[0].text, "beta");
        assert_eq!(second.cells[0].class.as_deref(), Some("strong"));
        assert_eq!(second.cells[1].text, "b,bb");
        assert_eq!(second.cells[2], ResourceCellView::badge("BETA"));
        assert_eq!(second.cells[3].actions.len(), 1);
        assert_eq!(second.cells[3].actions[0].action, "/tags/2/delete");
        assert_eq!(view.rows[0].cells[1].text, "");
    }

    #[tokio::test]
    async fn invalid_submissions_never_reach_the_callback() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        let manager = ResourceManager::new(
            "permissions",
            "Available permissions",
            ResourceRoutes::new("/access/permissions"),
            loaded(Vec::new()),
        )
        .fields(vec![key_field()])
        .on_create(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
            async { Ok(()) }
        });

        let mut modal = manager.open_create().expect("create form");
        let outcome = manager.submit(&mut modal, &pairs(&[("name", "read_user")])).await;
        assert_eq!(outcome, SubmitOutcome::Invalid);
        assert_eq!(
            modal.errors().get("name").map(|error| error.humanized()),
            Some("Invalid format.".to_string())
        );

        let outcome = manager.submit(&mut modal, &pairs(&[])).await;
        assert_eq!(outcome, SubmitOutcome::Invalid);
        assert_eq!(
            modal.errors().get("name").map(|error| error.humanized()),
            Some("This field is required.".to_string())
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn successful_saves_close_exactly_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        let collection = loaded(Vec::new());
        let target = collection.clone();
        let manager = ResourceManager::new(
            "permissions",
            "Available permissions",
            ResourceRoutes::new("/access/permissions"),
            collection,
        )
        .fields(vec![key_field()])
        .on_create(move |values| {
            seen.fetch_add(1, Ordering::SeqCst);
            let target = target.clone();
            async move {
                target.apply_created(tag("9", values.text("name")));
                Ok(())
            }
        });

        let mut modal = manager.open_create().expect("create form");
        let outcome = manager.submit(&mut modal, &pairs(&[("name", "READ_USER")])).await;
        assert!(outcome.closes_modal());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!manager.collection().is_saving());
        assert_eq!(manager.collection().len(), 1);
    }

    #[tokio::test]
    async fn saves_in_flight_ignore_new_submissions() {
        let collection = loaded(Vec::new());
        let manager = ResourceManager::new(
            "permissions",
            "Available permissions",
            ResourceRoutes::new("/access/permissions"),
            collection.clone(),
        )
        .fields(vec![key_field()])
        .on_create(|_| async { Ok(()) });

        let _guard = collection.try_begin_save().expect("guard");
        let mut modal = manager.open_create().expect("create form");
        let outcome = manager.submit(&mut modal, &pairs(&[("name", "READ_USER")])).await;
        assert_eq!(outcome, SubmitOutcome::Ignored);
        assert!(manager.table_view().create_disabled);
    }

    #[tokio::test]
    async fn field_rejections_keep_the_modal_open() {
        let manager = ResourceManager::new(
            "tags",
            "Tags",
            ResourceRoutes::new("/tags"),
            loaded(vec![tag("1", "ALPHA")]),
        )
        .fields(vec![key_field()])
        .on_edit(|_, _| async {
            let mut fields = BTreeMap::new();
            fields.insert("name".to_string(), "Already exists".to_string());
            Err(ResourceError::Fields(fields))
        });

        assert!(manager.open_edit("missing").is_none());
        let mut modal = manager.open_edit("1").expect("edit form");
        assert_eq!(modal.values().text("name"), "ALPHA");

        let outcome = manager.submit(&mut modal, &pairs(&[("name", "BETA")])).await;
        assert_eq!(outcome, SubmitOutcome::Rejected);
        let view = manager.modal_view(&modal);
        assert_eq!(view.form_action, "/tags/1");
        assert_eq!(view.fields[0].error.as_deref(), Some("Already exists"));
    }

    #[tokio::test]
    async fn deletes_delegate_confirmation_to_the_callback() {
        let manager = ResourceManager::new(
            "tags",
            "Tags",
            ResourceRoutes::new("/tags"),
            loaded(vec![tag("1", "a")]),
        );
        assert!(manager.delete("1", Confirmation::Pending).await.is_none());

        let manager = manager.on_delete(|_, confirmation| async move {
            Ok(match confirmation {
                Confirmation::Pending => DeleteOutcome::ConfirmationRequired("Sure?".into()),
                Confirmation::Confirmed => DeleteOutcome::Deleted,
            })
        });
        assert_eq!(
            manager.delete("1", Confirmation::Pending).await,
            Some(Ok(DeleteOutcome::ConfirmationRequired("Sure?".into())))
        );
        assert_eq!(
            manager.delete("1", Confirmation::Confirmed).await,
            Some(Ok(DeleteOutcome::Deleted))
        );
        assert_eq!(manager.confirm_view("1", "Sure?".into()).confirm_action, "/tags/1/delete");
    }
}
