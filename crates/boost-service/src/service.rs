//! Boost service
//!
//! One method per RPC operation. Each method resolves the caller from the
//! session, awaits whatever effects it needs (clock, signing, verification),
//! then runs the authorization check and the write together in a single
//! store transaction. Reads run against a snapshot.

use crate::config::BoostServiceConfig;
use crate::requests::{BoostUpdates, CreateBoost, Issued, RecipientQuery};
use boost_authorization::PermissionResolver;
use boost_claims::{ClaimHookEngine, NewClaimHook};
use boost_core::{
    BoostConfig, BoostEffects, BoostError, BoostFact, BoostResult, BoostUri, Capability,
    CredentialPayload, CredentialRef, HookId, Page, PageRequest, PermissionSet, PermissionUpdate,
    ProfileId, SessionToken, SignedCredential,
};
use boost_ledger::{
    analytics, recipient_count, recipients, revoked_for, BoostAnalytics, Issuance,
    IssuanceLedger, RecipientCursor,
};
use boost_store::{Boost, BoostStore, ClaimHook, IssuanceRecord, Profile, StoreState};
use tracing::{debug, info, instrument};

/// RPC-surface facade
pub struct BoostService<S, E> {
    config: BoostServiceConfig,
    store: S,
    effects: E,
    ledger: IssuanceLedger<ClaimHookEngine>,
}

impl<S, E> std::fmt::Debug for BoostService<S, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoostService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn require_profile(state: &StoreState, actor: &ProfileId) -> BoostResult<()> {
    if state.profiles.contains(actor) {
        Ok(())
    } else {
        Err(BoostError::unauthorized(format!("{actor} has no profile")))
    }
}

fn owned(boosts: Vec<&Boost>) -> Vec<Boost> {
    boosts.into_iter().cloned().collect()
}

impl<S: BoostStore, E: BoostEffects> BoostService<S, E> {
    /// Service over `store` and `effects`; fails if `config` is invalid
    pub fn new(config: BoostServiceConfig, store: S, effects: E) -> BoostResult<Self> {
        config.validate()?;
        let ledger = IssuanceLedger::new(ClaimHookEngine::new(config.max_hooks_per_boost));
        Ok(Self {
            config,
            store,
            effects,
            ledger,
        })
    }

    /// Active configuration
    pub fn config(&self) -> &BoostServiceConfig {
        &self.config
    }

    /// Effect handlers
    pub fn effects(&self) -> &E {
        &self.effects
    }

    /// Underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Committed facts, oldest first
    pub fn journal(&self) -> Vec<BoostFact> {
        self.store.journal()
    }

    async fn actor(&self, session: &SessionToken) -> BoostResult<ProfileId> {
        self.effects
            .resolve_actor(session)
            .await
            .ok_or_else(|| BoostError::unauthorized("Missing or expired session"))
    }

    // ========================================================================
    // Profiles
    // ========================================================================

    /// Register the caller's profile under `profile_id`.
    ///
    /// # Errors
    ///
    /// `BadRequest` for a malformed handle, `Unauthorized` when the session
    /// belongs to someone else, `Conflict` for a taken handle.
    #[instrument(skip_all, fields(profile = profile_id))]
    pub async fn create_profile(
        &self,
        session: &SessionToken,
        profile_id: &str,
        display_name: Option<String>,
    ) -> BoostResult<Profile> {
        let actor = self.actor(session).await?;
        let profile_id = ProfileId::parse(profile_id)?;
        if profile_id != actor {
            return Err(BoostError::unauthorized(format!(
                "Session belongs to {actor}, not {profile_id}"
            )));
        }
        let now = self.effects.now_ms().await;
        self.store.with_transaction(|state| {
            let profile = Profile {
                profile_id,
                display_name,
                created_at: now,
            };
            state.profiles.insert(profile.clone())?;
            info!(profile = %profile.profile_id, "profile created");
            Ok(profile)
        })
    }

    /// Look up a profile
    pub async fn get_profile(
        &self,
        session: &SessionToken,
        profile_id: &ProfileId,
    ) -> BoostResult<Profile> {
        self.actor(session).await?;
        self.store
            .snapshot(|state| state.profiles.require(profile_id).cloned())
    }

    // ========================================================================
    // Boost lifecycle
    // ========================================================================

    /// Create a root boost owned by the caller
    #[instrument(skip_all)]
    pub async fn create_boost(
        &self,
        session: &SessionToken,
        request: CreateBoost,
    ) -> BoostResult<BoostUri> {
        let actor = self.actor(session).await?;
        let now = self.effects.now_ms().await;
        let uri = BoostUri::generate(&self.config.domain);
        self.store.with_transaction(|state| {
            require_profile(state, &actor)?;
            insert_boost(state, &actor, uri, None, request, now)
        })
    }

    /// Create a boost under `parent`; requires `createChildren` on the parent.
    ///
    /// The child starts with no default policy of its own unless `request`
    /// supplies one. An explicit `createChildren` scope lists the boosts it
    /// applies at, so it authorizes creating under the listed boosts; the new
    /// child has no URI yet and cannot itself be listed.
    #[instrument(skip_all, fields(parent = %parent))]
    pub async fn create_child_boost(
        &self,
        session: &SessionToken,
        parent: &BoostUri,
        request: CreateBoost,
    ) -> BoostResult<BoostUri> {
        let actor = self.actor(session).await?;
        let now = self.effects.now_ms().await;
        let uri = BoostUri::generate(&self.config.domain);
        self.store.with_transaction(|state| {
            require_profile(state, &actor)?;
            state.graph.require(parent)?;
            PermissionResolver::over(state).require(&actor, parent, Capability::CreateChildren)?;
            insert_boost(state, &actor, uri, Some(parent.clone()), request, now)
        })
    }

    /// Edit a boost's template or policies; requires `edit`.
    ///
    /// A new claim role hands its permissions to every future claimant, so
    /// the caller must hold each permission it names on `uri`. Returns
    /// `false` when `updates` names nothing.
    #[instrument(skip_all, fields(boost = %uri))]
    pub async fn update_boost(
        &self,
        session: &SessionToken,
        uri: &BoostUri,
        updates: BoostUpdates,
    ) -> BoostResult<bool> {
        let actor = self.actor(session).await?;
        let now = self.effects.now_ms().await;
        self.store.with_transaction(|state| {
            require_profile(state, &actor)?;
            state.graph.require(uri)?;
            let resolver = PermissionResolver::over(state);
            resolver.require(&actor, uri, Capability::Edit)?;
            if let Some(permissions) = &updates.claim_permissions {
                resolver.ensure_can_grant(&actor, uri, &PermissionUpdate::from(permissions))?;
            }
            if updates.is_empty() {
                return Ok(false);
            }

            let boost = state
                .graph
                .get_mut(uri)
                .ok_or_else(|| BoostError::not_found(format!("Boost not found: {uri}")))?;
            if let Some(name) = updates.name {
                boost.payload.name = Some(name);
            }
            if let Some(category) = updates.category {
                boost.payload.category = Some(category);
            }
            if let Some(credential) = updates.credential {
                boost.payload.credential = credential;
            }
            if let Some(permissions) = updates.default_permissions {
                boost.default_permissions = Some(permissions);
            }
            if let Some(permissions) = updates.claim_permissions {
                boost.claim_permissions = Some(permissions);
            }
            boost.updated_at_ms = now;

            state.record(BoostFact::BoostUpdated {
                boost: uri.clone(),
                editor: actor.clone(),
                updated_at_ms: now,
            });
            info!(boost = %uri, %actor, "boost updated");
            Ok(true)
        })
    }

    /// Fetch a boost
    pub async fn get_boost(&self, session: &SessionToken, uri: &BoostUri) -> BoostResult<Boost> {
        self.actor(session).await?;
        self.store
            .snapshot(|state| state.graph.require(uri).cloned())
    }

    // ========================================================================
    // Admins and permissions
    // ========================================================================

    /// Give `profile_id` every boolean flag on `uri`, keeping its delegation
    /// flags. Requires `managePermissions` and the admin flags themselves.
    #[instrument(skip_all, fields(boost = %uri, admin = %profile_id))]
    pub async fn add_boost_admin(
        &self,
        session: &SessionToken,
        uri: &BoostUri,
        profile_id: &ProfileId,
    ) -> BoostResult<()> {
        let actor = self.actor(session).await?;
        let now = self.effects.now_ms().await;
        let update = PermissionUpdate::from(&PermissionSet::admin());
        self.store.with_transaction(|state| {
            require_profile(state, &actor)?;
            state.graph.require(uri)?;
            let resolver = PermissionResolver::over(state);
            resolver.require(&actor, uri, Capability::ManagePermissions)?;
            resolver.ensure_can_grant(&actor, uri, &update)?;
            state.profiles.require(profile_id)?;
            update_explicit(state, profile_id, uri, &update, now);
            info!(boost = %uri, admin = %profile_id, %actor, "admin added");
            Ok(())
        })
    }

    /// Clear `profile_id`'s explicit role on `uri`; requires
    /// `managePermissions`. The boost's creator cannot be removed.
    #[instrument(skip_all, fields(boost = %uri, admin = %profile_id))]
    pub async fn remove_boost_admin(
        &self,
        session: &SessionToken,
        uri: &BoostUri,
        profile_id: &ProfileId,
    ) -> BoostResult<()> {
        let actor = self.actor(session).await?;
        let now = self.effects.now_ms().await;
        self.store.with_transaction(|state| {
            require_profile(state, &actor)?;
            let creator = state.graph.require(uri)?.creator.clone();
            PermissionResolver::over(state).require(&actor, uri, Capability::ManagePermissions)?;
            if &creator == profile_id {
                return Err(BoostError::bad_request(format!(
                    "Cannot remove the creator of {uri}"
                )));
            }
            state.profiles.require(profile_id)?;
            let change = state
                .grants
                .set_explicit(profile_id, uri, PermissionSet::empty());
            state.record(change.to_fact(now));
            info!(boost = %uri, admin = %profile_id, %actor, "admin removed");
            Ok(())
        })
    }

    /// Profiles whose direct role on `uri` carries every admin flag,
    /// ordered by profile id
    pub async fn get_boost_admins(
        &self,
        session: &SessionToken,
        uri: &BoostUri,
        page: PageRequest,
    ) -> BoostResult<Page<ProfileId>> {
        self.actor(session).await?;
        let limit = self.config.page_limit(page.limit)?;
        let after = page.cursor.map(ProfileId::new);
        self.store.snapshot(|state| {
            state.graph.require(uri)?;
            let admins = state
                .grants
                .roles_on(uri)
                .filter(|(_, edge)| edge.effective().is_admin())
                .map(|(id, _)| id)
                .filter(|id| after.as_ref().map_or(true, |after| *id > after))
                .cloned();
            Ok(Page::from_ordered(admins, limit, ProfileId::to_string))
        })
    }

    /// Caller's resolved permissions on `uri`
    pub async fn get_boost_permissions(
        &self,
        session: &SessionToken,
        uri: &BoostUri,
    ) -> BoostResult<PermissionSet> {
        let actor = self.actor(session).await?;
        self.store.snapshot(|state| {
            state.graph.require(uri)?;
            Ok(PermissionResolver::over(state).effective_permissions(&actor, uri))
        })
    }

    /// Another profile's resolved permissions on `uri`; requires
    /// `managePermissions`
    pub async fn get_other_boost_permissions(
        &self,
        session: &SessionToken,
        uri: &BoostUri,
        profile_id: &ProfileId,
    ) -> BoostResult<PermissionSet> {
        let actor = self.actor(session).await?;
        self.store.snapshot(|state| {
            state.graph.require(uri)?;
            let resolver = PermissionResolver::over(state);
            resolver.require(&actor, uri, Capability::ManagePermissions)?;
            state.profiles.require(profile_id)?;
            Ok(resolver.effective_permissions(profile_id, uri))
        })
    }

    /// Overwrite fields of the caller's own explicit role on `uri`
    #[instrument(skip_all, fields(boost = %uri))]
    pub async fn update_boost_permissions(
        &self,
        session: &SessionToken,
        uri: &BoostUri,
        update: PermissionUpdate,
    ) -> BoostResult<bool> {
        let actor = self.actor(session).await?;
        self.update_role(actor.clone(), uri, &actor, update).await
    }

    /// Overwrite fields of `profile_id`'s explicit role on `uri`
    #[instrument(skip_all, fields(boost = %uri, grantee = %profile_id))]
    pub async fn update_other_boost_permissions(
        &self,
        session: &SessionToken,
        uri: &BoostUri,
        profile_id: &ProfileId,
        update: PermissionUpdate,
    ) -> BoostResult<bool> {
        let actor = self.actor(session).await?;
        self.update_role(actor, uri, profile_id, update).await
    }

    async fn update_role(
        &self,
        actor: ProfileId,
        uri: &BoostUri,
        grantee: &ProfileId,
        update: PermissionUpdate,
    ) -> BoostResult<bool> {
        let now = self.effects.now_ms().await;
        self.store.with_transaction(|state| {
            require_profile(state, &actor)?;
            state.graph.require(uri)?;
            let resolver = PermissionResolver::over(state);
            resolver.require(&actor, uri, Capability::ManagePermissions)?;
            state.profiles.require(grantee)?;
            if update.is_empty() {
                return Ok(false);
            }
            resolver.ensure_can_grant(&actor, uri, &update)?;
            update_explicit(state, grantee, uri, &update, now);
            info!(boost = %uri, %grantee, %actor, "permissions updated");
            Ok(true)
        })
    }

    // ========================================================================
    // Issuance
    // ========================================================================

    /// Record a credential the caller signed elsewhere.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown boost or recipient, `Unauthorized` without
    /// `issue`, `BadRequest` when the credential fails verification or names
    /// another boost, `Conflict` when it is already tracked.
    #[instrument(skip_all, fields(boost = %uri, recipient = %recipient, credential = %credential.id()))]
    pub async fn send_boost(
        &self,
        session: &SessionToken,
        uri: &BoostUri,
        recipient: &ProfileId,
        credential: SignedCredential,
    ) -> BoostResult<IssuanceRecord> {
        let actor = self.actor(session).await?;
        self.store
            .snapshot(|state| self.check_can_issue(state, &actor, uri, recipient))?;
        if credential.boost_uri() != uri {
            return Err(BoostError::bad_request(format!(
                "Credential {} is issued under {}, not {uri}",
                credential.id(),
                credential.boost_uri()
            )));
        }
        if !self.effects.verify(&credential).await? {
            return Err(BoostError::bad_request(format!(
                "Credential {} failed verification",
                credential.id()
            )));
        }

        let now = self.effects.now_ms().await;
        self.store.with_transaction(|state| {
            require_profile(state, &actor)?;
            self.ledger.send(
                state,
                Issuance {
                    boost: uri.clone(),
                    issuer: actor.clone(),
                    recipient: recipient.clone(),
                    credential: credential.id().clone(),
                },
                now,
            )
        })
    }

    /// Sign a fresh credential from the boost template and record it
    #[instrument(skip_all, fields(boost = %uri, recipient = %recipient))]
    pub async fn issue_boost(
        &self,
        session: &SessionToken,
        uri: &BoostUri,
        recipient: &ProfileId,
    ) -> BoostResult<Issued> {
        let actor = self.actor(session).await?;
        let body = self.store.snapshot(|state| {
            self.check_can_issue(state, &actor, uri, recipient)?;
            Ok::<_, BoostError>(state.graph.require(uri)?.payload.credential.clone())
        })?;
        let credential = self
            .effects
            .sign(CredentialPayload {
                id: CredentialRef::generate(&self.config.domain),
                boost_uri: uri.clone(),
                issuer: actor.clone(),
                subject: recipient.clone(),
                body,
            })
            .await?;

        let now = self.effects.now_ms().await;
        let record = self.store.with_transaction(|state| {
            require_profile(state, &actor)?;
            self.ledger.send(
                state,
                Issuance {
                    boost: uri.clone(),
                    issuer: actor.clone(),
                    recipient: recipient.clone(),
                    credential: credential.id().clone(),
                },
                now,
            )
        })?;
        Ok(Issued { record, credential })
    }

    fn check_can_issue(
        &self,
        state: &StoreState,
        actor: &ProfileId,
        uri: &BoostUri,
        recipient: &ProfileId,
    ) -> BoostResult<()> {
        require_profile(state, actor)?;
        state.graph.require(uri)?;
        PermissionResolver::over(state).require(actor, uri, Capability::Issue)?;
        state.profiles.require(recipient)?;
        Ok(())
    }

    /// Claim a credential addressed to the caller, firing claim hooks
    #[instrument(skip_all, fields(credential = %credential))]
    pub async fn accept_credential(
        &self,
        session: &SessionToken,
        credential: &CredentialRef,
    ) -> BoostResult<IssuanceRecord> {
        let actor = self.actor(session).await?;
        let now = self.effects.now_ms().await;
        self.store.with_transaction(|state| {
            require_profile(state, &actor)?;
            self.ledger.claim(state, &actor, credential, now)
        })
    }

    /// Revoke everything `recipient` holds under `uri`; repeat calls succeed
    #[instrument(skip_all, fields(boost = %uri, recipient = %recipient))]
    pub async fn revoke_boost_recipient(
        &self,
        session: &SessionToken,
        uri: &BoostUri,
        recipient: &ProfileId,
    ) -> BoostResult<bool> {
        let actor = self.actor(session).await?;
        let now = self.effects.now_ms().await;
        let revoked = self.store.with_transaction(|state| {
            require_profile(state, &actor)?;
            self.ledger
                .revoke_recipient(state, &actor, uri, recipient, now)
        })?;
        debug!(boost = %uri, %recipient, newly_revoked = revoked.len(), "revoke finished");
        Ok(true)
    }

    /// Records issued under `uri`, newest first
    pub async fn get_boost_recipients(
        &self,
        session: &SessionToken,
        uri: &BoostUri,
        query: RecipientQuery,
    ) -> BoostResult<Page<IssuanceRecord>> {
        self.recipients_under(session, uri, 0, query).await
    }

    /// Distinct non-revoked recipients under `uri`
    pub async fn get_boost_recipient_count(
        &self,
        session: &SessionToken,
        uri: &BoostUri,
    ) -> BoostResult<usize> {
        self.recipient_count_under(session, uri, 0).await
    }

    /// Records issued under `uri` and its descendants up to `generations`
    pub async fn get_boost_recipients_with_children(
        &self,
        session: &SessionToken,
        uri: &BoostUri,
        generations: u32,
        query: RecipientQuery,
    ) -> BoostResult<Page<IssuanceRecord>> {
        self.recipients_under(session, uri, generations, query)
            .await
    }

    /// Distinct non-revoked recipients under `uri` and its descendants
    pub async fn get_boost_recipients_with_children_count(
        &self,
        session: &SessionToken,
        uri: &BoostUri,
        generations: u32,
    ) -> BoostResult<usize> {
        self.recipient_count_under(session, uri, generations).await
    }

    async fn recipients_under(
        &self,
        session: &SessionToken,
        uri: &BoostUri,
        generations: u32,
        query: RecipientQuery,
    ) -> BoostResult<Page<IssuanceRecord>> {
        self.actor(session).await?;
        let limit = self.config.page_limit(query.page.limit)?;
        let cursor = query
            .page
            .cursor
            .as_deref()
            .map(str::parse::<RecipientCursor>)
            .transpose()?;
        self.store.snapshot(|state| {
            let boosts = subtree(state, uri, generations)?;
            Ok(recipients(state, &boosts, query.filter, limit, cursor))
        })
    }

    async fn recipient_count_under(
        &self,
        session: &SessionToken,
        uri: &BoostUri,
        generations: u32,
    ) -> BoostResult<usize> {
        self.actor(session).await?;
        self.store.snapshot(|state| {
            let boosts = subtree(state, uri, generations)?;
            Ok(recipient_count(state, &boosts))
        })
    }

    /// Revoked records held by the caller across all boosts
    pub async fn get_revoked_credentials(
        &self,
        session: &SessionToken,
    ) -> BoostResult<Vec<IssuanceRecord>> {
        let actor = self.actor(session).await?;
        Ok(self.store.snapshot(|state| revoked_for(state, &actor)))
    }

    /// Issuance totals for `uri`; requires `viewAnalytics`
    pub async fn get_boost_analytics(
        &self,
        session: &SessionToken,
        uri: &BoostUri,
    ) -> BoostResult<BoostAnalytics> {
        let actor = self.actor(session).await?;
        self.store.snapshot(|state| {
            state.graph.require(uri)?;
            PermissionResolver::over(state).require(&actor, uri, Capability::ViewAnalytics)?;
            Ok(analytics(state, uri))
        })
    }

    // ========================================================================
    // Claim hooks
    // ========================================================================

    /// Register a claim hook
    #[instrument(skip_all, fields(claim = %request.claim_uri, target = %request.target_uri))]
    pub async fn create_claim_hook(
        &self,
        session: &SessionToken,
        request: NewClaimHook,
    ) -> BoostResult<HookId> {
        let actor = self.actor(session).await?;
        let now = self.effects.now_ms().await;
        self.store.with_transaction(|state| {
            require_profile(state, &actor)?;
            let hook = self.ledger.hooks().register(state, &actor, request, now)?;
            Ok(hook.id)
        })
    }

    /// Hooks triggered by claims under `uri`
    pub async fn get_claim_hooks_for_boost(
        &self,
        session: &SessionToken,
        uri: &BoostUri,
    ) -> BoostResult<Vec<ClaimHook>> {
        self.actor(session).await?;
        self.store.snapshot(|state| {
            state.graph.require(uri)?;
            Ok(ClaimHookEngine::hooks_for(state, uri))
        })
    }

    /// Remove a claim hook; grants it already made stay in place
    #[instrument(skip_all, fields(hook_id = %hook_id))]
    pub async fn delete_claim_hook(
        &self,
        session: &SessionToken,
        hook_id: &HookId,
    ) -> BoostResult<bool> {
        let actor = self.actor(session).await?;
        let now = self.effects.now_ms().await;
        self.store.with_transaction(|state| {
            require_profile(state, &actor)?;
            self.ledger.hooks().delete(state, &actor, hook_id, now)?;
            Ok(true)
        })
    }

    // ========================================================================
    // Hierarchy
    // ========================================================================

    async fn related(
        &self,
        session: &SessionToken,
        uri: &BoostUri,
        select: impl FnOnce(&StoreState) -> Vec<Boost>,
    ) -> BoostResult<Vec<Boost>> {
        self.actor(session).await?;
        self.store.snapshot(|state| {
            state.graph.require(uri)?;
            Ok(select(state))
        })
    }

    /// Descendants of `uri` up to `generations` levels down
    pub async fn get_boost_children(
        &self,
        session: &SessionToken,
        uri: &BoostUri,
        generations: u32,
    ) -> BoostResult<Vec<Boost>> {
        self.related(session, uri, |state| {
            owned(state.graph.children(uri, generations))
        })
        .await
    }

    /// Number of descendants up to `generations` levels down
    pub async fn count_boost_children(
        &self,
        session: &SessionToken,
        uri: &BoostUri,
        generations: u32,
    ) -> BoostResult<usize> {
        Ok(self.get_boost_children(session, uri, generations).await?.len())
    }

    /// Ancestors of `uri` up to `generations` levels up, nearest first
    pub async fn get_boost_parents(
        &self,
        session: &SessionToken,
        uri: &BoostUri,
        generations: u32,
    ) -> BoostResult<Vec<Boost>> {
        self.related(session, uri, |state| {
            owned(state.graph.parents(uri, generations))
        })
        .await
    }

    /// Number of ancestors up to `generations` levels up
    pub async fn count_boost_parents(
        &self,
        session: &SessionToken,
        uri: &BoostUri,
        generations: u32,
    ) -> BoostResult<usize> {
        Ok(self.get_boost_parents(session, uri, generations).await?.len())
    }

    /// Other children of `uri`'s parent
    pub async fn get_boost_siblings(
        &self,
        session: &SessionToken,
        uri: &BoostUri,
    ) -> BoostResult<Vec<Boost>> {
        self.related(session, uri, |state| owned(state.graph.siblings(uri)))
            .await
    }

    /// Number of siblings
    pub async fn count_boost_siblings(
        &self,
        session: &SessionToken,
        uri: &BoostUri,
    ) -> BoostResult<usize> {
        Ok(self.get_boost_siblings(session, uri).await?.len())
    }

    /// Ancestors, descendants and siblings of `uri`, each once
    pub async fn get_familial_boosts(
        &self,
        session: &SessionToken,
        uri: &BoostUri,
        parent_generations: u32,
        child_generations: u32,
    ) -> BoostResult<Vec<Boost>> {
        self.related(session, uri, |state| {
            owned(
                state
                    .graph
                    .familial(uri, parent_generations, child_generations),
            )
        })
        .await
    }

    /// Number of familial boosts
    pub async fn count_familial_boosts(
        &self,
        session: &SessionToken,
        uri: &BoostUri,
        parent_generations: u32,
        child_generations: u32,
    ) -> BoostResult<usize> {
        Ok(self
            .get_familial_boosts(session, uri, parent_generations, child_generations)
            .await?
            .len())
    }

    /// Attach `child` under `parent`; requires `createChildren` on the
    /// parent and `edit` on the child
    #[instrument(skip_all, fields(parent = %parent, child = %child))]
    pub async fn make_boost_parent(
        &self,
        session: &SessionToken,
        parent: &BoostUri,
        child: &BoostUri,
    ) -> BoostResult<bool> {
        let actor = self.actor(session).await?;
        let now = self.effects.now_ms().await;
        self.store.with_transaction(|state| {
            require_profile(state, &actor)?;
            state.graph.require(parent)?;
            state.graph.require(child)?;
            let resolver = PermissionResolver::over(state);
            resolver.require(&actor, parent, Capability::CreateChildren)?;
            resolver.require(&actor, child, Capability::Edit)?;
            state.graph.set_parent(child, parent)?;
            state.record(BoostFact::BoostReparented {
                boost: child.clone(),
                parent: Some(parent.clone()),
                actor: actor.clone(),
                reparented_at_ms: now,
            });
            info!(%parent, %child, %actor, "boost reparented");
            Ok(true)
        })
    }

    /// Detach `child` from its parent; requires `edit` on the child.
    ///
    /// Returns `false` if it had no parent.
    #[instrument(skip_all, fields(child = %child))]
    pub async fn remove_boost_parent(
        &self,
        session: &SessionToken,
        child: &BoostUri,
    ) -> BoostResult<bool> {
        let actor = self.actor(session).await?;
        let now = self.effects.now_ms().await;
        self.store.with_transaction(|state| {
            require_profile(state, &actor)?;
            state.graph.require(child)?;
            PermissionResolver::over(state).require(&actor, child, Capability::Edit)?;
            let Some(former) = state.graph.remove_parent(child)? else {
                return Ok(false);
            };
            state.record(BoostFact::BoostReparented {
                boost: child.clone(),
                parent: None,
                actor: actor.clone(),
                reparented_at_ms: now,
            });
            info!(%former, %child, %actor, "boost detached");
            Ok(true)
        })
    }
}

fn insert_boost(
    state: &mut StoreState,
    creator: &ProfileId,
    uri: BoostUri,
    parent: Option<BoostUri>,
    request: CreateBoost,
    now_ms: u64,
) -> BoostResult<BoostUri> {
    let mut boost = Boost::new(uri.clone(), creator.clone(), request.payload, now_ms)
        .with_default_permissions(request.default_permissions)
        .with_claim_permissions(request.claim_permissions);
    if let Some(parent) = parent.clone() {
        boost = boost.with_parent(parent);
    }
    state.graph.insert(boost)?;
    state.record(BoostFact::BoostCreated {
        boost: uri.clone(),
        parent,
        creator: creator.clone(),
        created_at_ms: now_ms,
    });

    let change = state
        .grants
        .set_explicit(creator, &uri, PermissionSet::creator());
    state.record(change.to_fact(now_ms));
    info!(boost = %uri, %creator, "boost created");
    Ok(uri)
}

fn update_explicit(
    state: &mut StoreState,
    grantee: &ProfileId,
    uri: &BoostUri,
    update: &PermissionUpdate,
    now_ms: u64,
) {
    let mut explicit = state
        .grants
        .role(grantee, uri)
        .map(|edge| edge.explicit().clone())
        .unwrap_or_default();
    update.apply_to(&mut explicit);
    let change = state.grants.set_explicit(grantee, uri, explicit);
    state.record(change.to_fact(now_ms));
}

/// `uri` followed by its descendants up to `generations` levels down
fn subtree(state: &StoreState, uri: &BoostUri, generations: u32) -> BoostResult<Vec<BoostUri>> {
    state.graph.require(uri)?;
    Ok(std::iter::once(uri.clone())
        .chain(
            state
                .graph
                .children(uri, generations)
                .into_iter()
                .map(|boost| boost.uri.clone()),
        )
        .collect())
}
