use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use client_core::{
    AuthContext, BlogClient, ClientError, ClientSettings, DemoCredentialVerifier, FetchOutcome,
    ListFetchController, Resource,
};
use shared::{
    domain::{Entity, EntityId},
    protocol::FilterKeys,
};
use tracing::debug;

use crate::render::{list_view, Render};

pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Everything a command needs: the REST client, the session and list sizing.
pub struct App {
    pub client: BlogClient,
    pub filter_keys: FilterKeys,
    auth: AuthContext,
    credentials: Option<Credentials>,
    page_size: u32,
}

fn failure(err: ClientError) -> anyhow::Error {
    debug!("request failed: {err}");
    anyhow!(err.user_message())
}

impl App {
    pub fn new(settings: &ClientSettings, credentials: Option<Credentials>) -> Result<Self> {
        let client = BlogClient::new(settings)?;
        let verifier = DemoCredentialVerifier::new(settings.accounts.clone());
        Ok(Self {
            client,
            filter_keys: settings.filter_keys.clone(),
            auth: AuthContext::new(Arc::new(verifier)),
            credentials,
            page_size: settings.page_size(),
        })
    }

    pub async fn health(&self) -> Result<()> {
        let message = self.client.health_check().await.map_err(failure)?;
        println!("{}", message.as_deref().unwrap_or("ok"));
        Ok(())
    }

    pub async fn login(&self) -> Result<()> {
        let credentials = self.credentials()?;
        let user = self
            .auth
            .login(&credentials.email, &credentials.password)
            .await?;
        let role = if user.role.can_manage_content() {
            "professor, can manage records"
        } else {
            "student, read only"
        };
        println!("signed in as {} <{}> ({role})", user.name, user.email);
        self.auth.logout().await;
        Ok(())
    }

    fn credentials(&self) -> Result<&Credentials> {
        self.credentials
            .as_ref()
            .ok_or_else(|| anyhow!("sign in required: pass --user and --password"))
    }

    async fn require_professor(&self) -> Result<()> {
        if !self.auth.is_authenticated().await {
            let credentials = self.credentials()?;
            self.auth
                .login(&credentials.email, &credentials.password)
                .await?;
        }
        self.auth.require_professor().await?;
        Ok(())
    }

    fn controller<E: Entity>(&self, resource: Resource<E>) -> ListFetchController<E> {
        ListFetchController::new(Arc::new(resource), self.page_size)
    }

    pub async fn list<E: Entity + Render>(
        &self,
        resource: Resource<E>,
        page: u32,
        all: bool,
        filters: Vec<(String, String)>,
    ) -> Result<()> {
        let list = self.controller(resource);
        list.set_filters(filters).await;
        let outcome = list.load(page, None).await;
        print_list(&list, outcome, all).await
    }

    pub async fn search<E: Entity + Render>(
        &self,
        resource: Resource<E>,
        term: &str,
        all: bool,
    ) -> Result<()> {
        let list = self.controller(resource);
        let outcome = list.search(term).await;
        print_list(&list, outcome, all).await
    }

    pub async fn show<E: Entity + Render>(&self, resource: Resource<E>, id: &str) -> Result<()> {
        let record = resource.get(&EntityId::new(id)).await.map_err(failure)?;
        println!("{}", record.detail());
        Ok(())
    }

    pub async fn create<E: Entity + Render>(
        &self,
        resource: Resource<E>,
        draft: E::Draft,
    ) -> Result<()> {
        self.require_professor().await?;
        let list = self.controller(resource.clone());
        let created = list
            .mutate_then_reload(|| resource.create(&draft))
            .await
            .map_err(failure)?;
        println!("created {} {}\n", E::KIND.label(), created.id());
        print_list(&list, FetchOutcome::Applied, false).await
    }

    pub async fn update<E: Entity + Render>(
        &self,
        resource: Resource<E>,
        id: &str,
        changes: E::Changes,
    ) -> Result<()> {
        self.require_professor().await?;
        let id = EntityId::new(id);
        let list = self.controller(resource.clone());
        let updated = list
            .mutate_then_reload(|| resource.update(&id, &changes))
            .await
            .map_err(failure)?;
        println!("{}", updated.detail());
        list.close();
        Ok(())
    }

    /// Deletes from the listing page the record was shown on, then prints
    /// the page the listing settles on.
    pub async fn delete<E: Entity + Render>(
        &self,
        resource: Resource<E>,
        id: &str,
        page: u32,
    ) -> Result<()> {
        self.require_professor().await?;
        let id = EntityId::new(id);
        let list = self.controller(resource.clone());
        list.load(page, None).await;
        let message = list
            .delete_then_reload(|| resource.delete(&id))
            .await
            .map_err(failure)?;
        println!(
            "{}\n",
            message.unwrap_or_else(|| format!("deleted {} {id}", E::KIND.label()))
        );
        print_list(&list, FetchOutcome::Applied, false).await
    }
}

/// With `all`, keeps appending pages until the last one or a failure.
async fn print_list<E: Entity + Render>(
    list: &ListFetchController<E>,
    mut outcome: FetchOutcome,
    all: bool,
) -> Result<()> {
    if all {
        while outcome == FetchOutcome::Applied && list.snapshot().await.has_more() {
            outcome = list.load_more().await;
        }
    }
    let state = list.snapshot().await;
    list.close();

    if !state.items.is_empty() || state.error.is_none() {
        println!("{}", list_view(&state));
    }
    if let Some(error) = state.error {
        bail!(error);
    }
    Ok(())
}
