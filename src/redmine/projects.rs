//! Redmine Projects
//!
//! List, show, create, update and delete projects.

use super::api::ResourceApi;
use super::transport::{Method, RawResponse, Transport};
use crate::error::Result;
use crate::resource::{
    resource_def, IndexBy, Listing, Params, QueryParams, ResourceCollection, ResourceId,
};
use serde_json::Value;

/// Project operations
pub struct Projects<T> {
    api: ResourceApi<T>,
}

impl<T: Transport + Clone> Projects<T> {
    pub fn new(transport: T) -> Self {
        Self {
            api: ResourceApi::new(transport, resource_def("projects")),
        }
    }

    pub fn with_page_size(self, page_size: u64) -> Self {
        Self {
            api: self.api.with_page_size(page_size),
        }
    }

    /// List projects (`offset`/`limit` and filters such as `status` go in `params`)
    pub async fn all(&mut self, params: &QueryParams) -> Result<&ResourceCollection> {
        self.api.all(params).await
    }

    pub async fn listing(
        &mut self,
        force_update: bool,
        params: &QueryParams,
        index_by: IndexBy,
    ) -> Result<Listing> {
        self.api.listing(force_update, params, index_by).await
    }

    pub async fn get_id_by_name(
        &mut self,
        name: &str,
        params: &QueryParams,
    ) -> Result<Option<ResourceId>> {
        self.api.get_id_by_name(name, params).await
    }

    pub fn invalidate(&mut self) {
        self.api.invalidate();
    }

    /// Project details including trackers, categories, attachments and relations
    pub async fn show(&self, id: &str) -> Result<Value> {
        let def = self.api.def();
        let mut path = def.member_path(id, "json");
        if !def.show_include.is_empty() {
            path = format!("{}?include={}", path, def.show_include.join(","));
        }
        self.api.get_json(&path).await
    }

    /// Create a project. `name` and `identifier` are mandatory.
    pub async fn create(&self, params: Params) -> Result<RawResponse> {
        let params = self.api.prepare(Params::new(), params);
        self.api.validate_create(&params)?;

        let path = format!("{}.xml", self.api.def().collection_path);
        self.api.send(Method::Post, &path, &params).await
    }

    pub async fn update(&self, id: &str, params: Params) -> Result<RawResponse> {
        let def = self.api.def();
        let leading = if def.update_sends_id {
            Params::new().with("id", id)
        } else {
            Params::new()
        };
        let params = self.api.prepare(leading, params);

        self.api
            .send(Method::Put, &def.member_path(id, "xml"), &params)
            .await
    }

    pub async fn remove(&self, id: &str) -> Result<RawResponse> {
        self.api.delete(&self.api.def().member_path(id, "xml")).await
    }
}
