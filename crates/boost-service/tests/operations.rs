//! Service operations: sessions, profiles, permission management,
//! hierarchy, issuance queries and hooks

use assert_matches::assert_matches;
use boost_claims::NewClaimHook;
use boost_core::{
    BoostError, BoostFact, BoostUri, ChildScope, CredentialRef, PageRequest, PermissionSet,
    PermissionUpdate, ProfileId, SessionToken,
};
use boost_service::{BoostServiceConfig, BoostUpdates, CreateBoost, RecipientQuery};
use boost_store::HookKind;
use boost_testkit::*;

async fn send(service: &TestService, uri: &BoostUri, recipient: &str, id: &str) {
    service
        .send_boost(
            &session("admin"),
            uri,
            &profile(recipient),
            credential_for(uri, "admin", recipient, id),
        )
        .await
        .unwrap();
}

async fn admin_with_boost() -> (TestService, BoostUri) {
    let service = test_service();
    register_profiles(&service, &["admin", "alice", "bob", "scout"]).await;
    let uri = service
        .create_boost(&session("admin"), named("Badge"))
        .await
        .unwrap();
    (service, uri)
}

// ============================================================================
// Sessions and profiles
// ============================================================================

#[tokio::test]
async fn every_operation_needs_a_session() {
    let (service, uri) = admin_with_boost().await;
    let anonymous = SessionToken::new("");
    assert_matches!(
        service.get_boost(&anonymous, &uri).await,
        Err(BoostError::Unauthorized { .. })
    );
    assert_matches!(
        service.get_boost_recipient_count(&anonymous, &uri).await,
        Err(BoostError::Unauthorized { .. })
    );
}

#[tokio::test]
async fn mutations_need_a_profile() {
    let (service, uri) = admin_with_boost().await;
    let ghost = session("ghost");
    assert_matches!(
        service.create_boost(&ghost, named("Mine")).await,
        Err(BoostError::Unauthorized { .. })
    );
    assert_matches!(
        service.create_child_boost(&ghost, &uri, named("Mine")).await,
        Err(BoostError::Unauthorized { .. })
    );
    service.get_boost(&ghost, &uri).await.unwrap();
}

#[tokio::test]
async fn profiles_are_validated_and_unique() {
    let service = test_service();
    let alice = session("alice");
    assert_matches!(
        service.create_profile(&alice, "A!", None).await,
        Err(BoostError::BadRequest { .. })
    );
    assert_matches!(
        service.create_profile(&alice, "bob", None).await,
        Err(BoostError::Unauthorized { .. })
    );

    let created = service
        .create_profile(&alice, "alice", Some("Alice".to_string()))
        .await
        .unwrap();
    assert_eq!(created.display_name.as_deref(), Some("Alice"));
    assert_matches!(
        service.create_profile(&alice, "alice", None).await,
        Err(BoostError::Conflict { .. })
    );
    assert_eq!(
        service
            .get_profile(&alice, &profile("alice"))
            .await
            .unwrap(),
        created
    );
}

#[tokio::test]
async fn malformed_and_unknown_uris() {
    let (service, _) = admin_with_boost().await;
    let malformed = "lc:boost:nope".parse::<BoostUri>();
    assert_matches!(malformed, Err(BoostError::BadRequest { .. }));

    let unknown = BoostUri::new(TEST_DOMAIN, "missing");
    assert_matches!(
        service.get_boost(&session("admin"), &unknown).await,
        Err(BoostError::NotFound { .. })
    );
    assert_matches!(
        service
            .create_child_boost(&session("admin"), &unknown, named("Orphan"))
            .await,
        Err(BoostError::NotFound { .. })
    );
}

// ============================================================================
// Boosts and permissions
// ============================================================================

#[tokio::test]
async fn creator_holds_everything_and_it_is_journaled() {
    let (service, uri) = admin_with_boost().await;
    let held = service
        .get_boost_permissions(&session("admin"), &uri)
        .await
        .unwrap();
    assert_eq!(held, PermissionSet::creator());
    assert_eq!(uri.domain(), TEST_DOMAIN);

    let journal = service.journal();
    assert_matches!(journal.first(), Some(BoostFact::BoostCreated { boost, .. }) if boost == &uri);
    assert!(journal
        .iter()
        .any(|fact| matches!(fact, BoostFact::RoleGranted { grantee, .. } if grantee == &profile("admin"))));
}

#[tokio::test]
async fn update_boost_requires_edit() {
    let (service, uri) = admin_with_boost().await;
    let rename = BoostUpdates {
        name: Some("Renamed".to_string()),
        ..BoostUpdates::default()
    };
    assert_matches!(
        service
            .update_boost(&session("alice"), &uri, rename.clone())
            .await,
        Err(BoostError::Unauthorized { .. })
    );
    assert!(!service
        .update_boost(&session("admin"), &uri, BoostUpdates::default())
        .await
        .unwrap());
    assert!(service
        .update_boost(&session("admin"), &uri, rename)
        .await
        .unwrap());

    let boost = service.get_boost(&session("alice"), &uri).await.unwrap();
    assert_eq!(boost.payload.name.as_deref(), Some("Renamed"));
    assert!(boost.updated_at_ms > boost.created_at_ms);
}

#[tokio::test]
async fn editors_cannot_set_a_claim_role_beyond_their_own() {
    let (service, uri) = admin_with_boost().await;
    let admin = session("admin");
    let alice = session("alice");
    service
        .update_other_boost_permissions(
            &admin,
            &uri,
            &profile("alice"),
            PermissionUpdate {
                can_edit: Some(true),
                can_issue: Some(true),
                ..PermissionUpdate::default()
            },
        )
        .await
        .unwrap();

    let takeover = BoostUpdates {
        default_permissions: Some(PermissionSet {
            can_issue: true,
            ..PermissionSet::empty()
        }),
        claim_permissions: Some(PermissionSet::creator()),
        ..BoostUpdates::default()
    };
    assert_matches!(
        service.update_boost(&alice, &uri, takeover).await,
        Err(BoostError::Unauthorized { .. })
    );
    let boost = service.get_boost(&alice, &uri).await.unwrap();
    assert!(boost.claim_permissions.is_none());
    assert!(boost.default_permissions.is_none());

    let within = BoostUpdates {
        claim_permissions: Some(PermissionSet {
            can_issue: true,
            ..PermissionSet::empty()
        }),
        ..BoostUpdates::default()
    };
    assert!(service.update_boost(&alice, &uri, within).await.unwrap());

    service
        .send_boost(
            &alice,
            &uri,
            &profile("scout"),
            credential_for(&uri, "alice", "scout", "c1"),
        )
        .await
        .unwrap();
    service
        .accept_credential(&session("scout"), &CredentialRef::new(TEST_DOMAIN, "c1"))
        .await
        .unwrap();
    let held = service
        .get_boost_permissions(&session("scout"), &uri)
        .await
        .unwrap();
    assert!(held.can_issue);
    assert!(!held.can_manage_permissions);
}

#[tokio::test]
async fn admins_are_listed_paged_and_removable() {
    let (service, uri) = admin_with_boost().await;
    let admin = session("admin");
    service
        .add_boost_admin(&admin, &uri, &profile("alice"))
        .await
        .unwrap();
    // upsert
    service
        .add_boost_admin(&admin, &uri, &profile("alice"))
        .await
        .unwrap();

    let first = service
        .get_boost_admins(&admin, &uri, PageRequest::first(1))
        .await
        .unwrap();
    assert_eq!(first.records, vec![profile("admin")]);
    assert!(first.has_more);
    let cursor = first.cursor.unwrap();
    let second = service
        .get_boost_admins(&admin, &uri, PageRequest::after(1, cursor))
        .await
        .unwrap();
    assert_eq!(second.records, vec![profile("alice")]);
    assert!(!second.has_more);

    assert_matches!(
        service
            .remove_boost_admin(&session("alice"), &uri, &profile("admin"))
            .await,
        Err(BoostError::BadRequest { .. })
    );
    service
        .remove_boost_admin(&admin, &uri, &profile("alice"))
        .await
        .unwrap();
    let remaining = service
        .get_boost_admins(&admin, &uri, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(remaining.records, vec![profile("admin")]);
}

#[tokio::test]
async fn managers_cannot_hand_out_what_they_lack() {
    let (service, uri) = admin_with_boost().await;
    let admin = session("admin");
    let alice = session("alice");
    service
        .update_other_boost_permissions(
            &admin,
            &uri,
            &profile("alice"),
            PermissionUpdate {
                can_manage_permissions: Some(true),
                ..PermissionUpdate::default()
            },
        )
        .await
        .unwrap();

    assert_matches!(
        service
            .update_other_boost_permissions(
                &alice,
                &uri,
                &profile("bob"),
                PermissionUpdate {
                    can_issue: Some(true),
                    ..PermissionUpdate::default()
                },
            )
            .await,
        Err(BoostError::Unauthorized { .. })
    );
    assert_matches!(
        service
            .update_boost_permissions(
                &alice,
                &uri,
                PermissionUpdate {
                    can_issue_children: Some(ChildScope::All),
                    ..PermissionUpdate::default()
                },
            )
            .await,
        Err(BoostError::Unauthorized { .. })
    );
    assert_matches!(
        service.add_boost_admin(&alice, &uri, &profile("bob")).await,
        Err(BoostError::Unauthorized { .. })
    );

    assert!(service
        .update_other_boost_permissions(
            &alice,
            &uri,
            &profile("bob"),
            PermissionUpdate {
                can_manage_permissions: Some(true),
                ..PermissionUpdate::default()
            },
        )
        .await
        .unwrap());
    let bob = service
        .get_other_boost_permissions(&alice, &uri, &profile("bob"))
        .await
        .unwrap();
    assert!(bob.can_manage_permissions);
    assert!(!bob.can_issue);

    assert_matches!(
        service
            .get_other_boost_permissions(&session("scout"), &uri, &profile("bob"))
            .await,
        Err(BoostError::Unauthorized { .. })
    );
}

// ============================================================================
// Hierarchy
// ============================================================================

#[tokio::test]
async fn explicit_create_scope_lists_the_parent() {
    let (service, root) = admin_with_boost().await;
    let admin = session("admin");
    let alice = session("alice");
    let other = service.create_boost(&admin, named("Other")).await.unwrap();
    let scope_at = |boost: &BoostUri| PermissionUpdate {
        can_create_children: Some(ChildScope::explicit([boost.clone()])),
        ..PermissionUpdate::default()
    };

    service
        .update_other_boost_permissions(&admin, &root, &profile("alice"), scope_at(&other))
        .await
        .unwrap();
    assert_matches!(
        service
            .create_child_boost(&alice, &root, named("Nope"))
            .await,
        Err(BoostError::Unauthorized { .. })
    );

    service
        .update_other_boost_permissions(&admin, &root, &profile("alice"), scope_at(&root))
        .await
        .unwrap();
    let child = service
        .create_child_boost(&alice, &root, named("Yes"))
        .await
        .unwrap();
    let parents = service.get_boost_parents(&alice, &child, 1).await.unwrap();
    assert_eq!(parents[0].uri, root);
}

#[tokio::test]
async fn hierarchy_queries_and_reparenting() {
    let (service, root) = admin_with_boost().await;
    let admin = session("admin");
    let a = service
        .create_child_boost(&admin, &root, named("A"))
        .await
        .unwrap();
    let b = service
        .create_child_boost(&admin, &root, named("B"))
        .await
        .unwrap();
    let g = service
        .create_child_boost(&admin, &a, named("G"))
        .await
        .unwrap();
    let loose = service.create_boost(&admin, named("Loose")).await.unwrap();

    let uris = |boosts: Vec<boost_store::Boost>| -> Vec<BoostUri> {
        boosts.into_iter().map(|boost| boost.uri).collect()
    };

    let children = service.get_boost_children(&admin, &root, 1).await.unwrap();
    assert_eq!(uris(children), vec![a.clone(), b.clone()]);
    assert_eq!(service.count_boost_children(&admin, &root, 2).await.unwrap(), 3);
    let parents = service.get_boost_parents(&admin, &g, 2).await.unwrap();
    assert_eq!(uris(parents), vec![a.clone(), root.clone()]);
    let siblings = service.get_boost_siblings(&admin, &a).await.unwrap();
    assert_eq!(uris(siblings), vec![b.clone()]);
    assert_eq!(service.count_familial_boosts(&admin, &a, 1, 1).await.unwrap(), 3);

    assert_matches!(
        service.make_boost_parent(&admin, &g, &root).await,
        Err(BoostError::BadRequest { .. })
    );
    assert_matches!(
        service.make_boost_parent(&admin, &a, &b).await,
        Err(BoostError::Conflict { .. })
    );
    assert_matches!(
        service.make_boost_parent(&session("alice"), &g, &loose).await,
        Err(BoostError::Unauthorized { .. })
    );

    assert!(service.make_boost_parent(&admin, &g, &loose).await.unwrap());
    assert_eq!(service.count_boost_parents(&admin, &loose, 5).await.unwrap(), 3);
    assert!(service.remove_boost_parent(&admin, &loose).await.unwrap());
    assert!(!service.remove_boost_parent(&admin, &loose).await.unwrap());
    assert_eq!(service.count_boost_siblings(&admin, &loose).await.unwrap(), 0);
}

// ============================================================================
// Issuance
// ============================================================================

#[tokio::test]
async fn send_boost_rejects_bad_credentials() {
    let (service, uri) = admin_with_boost().await;
    let admin = session("admin");
    let other = service.create_boost(&admin, named("Other")).await.unwrap();

    let misdirected = credential_for(&other, "admin", "scout", "x1");
    assert_matches!(
        service
            .send_boost(&admin, &uri, &profile("scout"), misdirected)
            .await,
        Err(BoostError::BadRequest { .. })
    );

    let forged = credential_for(&uri, "admin", "scout", "x2");
    service
        .effects()
        .credentials
        .reject(forged.id().clone());
    assert_matches!(
        service.send_boost(&admin, &uri, &profile("scout"), forged).await,
        Err(BoostError::BadRequest { .. })
    );

    assert_matches!(
        service
            .send_boost(
                &admin,
                &uri,
                &profile("nobody"),
                credential_for(&uri, "admin", "nobody", "x3"),
            )
            .await,
        Err(BoostError::NotFound { .. })
    );

    send(&service, &uri, "scout", "x4").await;
    assert_matches!(
        service
            .send_boost(
                &admin,
                &uri,
                &profile("scout"),
                credential_for(&uri, "admin", "scout", "x4"),
            )
            .await,
        Err(BoostError::Conflict { .. })
    );
}

#[tokio::test]
async fn issue_boost_signs_from_the_template() {
    let (service, uri) = admin_with_boost().await;
    let issued = service
        .issue_boost(&session("admin"), &uri, &profile("scout"))
        .await
        .unwrap();
    assert_eq!(&issued.record.credential, issued.credential.id());
    assert_eq!(issued.credential.boost_uri(), &uri);
    assert_eq!(
        service.effects().credentials.signed(),
        vec![issued.record.credential.clone()]
    );

    assert_matches!(
        service
            .issue_boost(&session("alice"), &uri, &profile("scout"))
            .await,
        Err(BoostError::Unauthorized { .. })
    );
    assert_eq!(service.effects().credentials.signed().len(), 1);
}

#[tokio::test]
async fn only_the_recipient_claims_and_revoked_cannot_be_claimed() {
    let (service, uri) = admin_with_boost().await;
    send(&service, &uri, "scout", "c1").await;
    let credential = CredentialRef::new(TEST_DOMAIN, "c1");

    assert_matches!(
        service.accept_credential(&session("alice"), &credential).await,
        Err(BoostError::Unauthorized { .. })
    );
    service
        .revoke_boost_recipient(&session("admin"), &uri, &profile("scout"))
        .await
        .unwrap();
    assert_matches!(
        service.accept_credential(&session("scout"), &credential).await,
        Err(BoostError::BadRequest { .. })
    );

    let revoked = service
        .get_revoked_credentials(&session("scout"))
        .await
        .unwrap();
    assert_eq!(revoked.len(), 1);
    assert_eq!(revoked[0].credential, credential);

    assert_matches!(
        service
            .revoke_boost_recipient(&session("admin"), &uri, &profile("alice"))
            .await,
        Err(BoostError::NotFound { .. })
    );
}

#[tokio::test]
async fn recipients_are_filtered_and_paged_newest_first() {
    let (service, uri) = admin_with_boost().await;
    let admin = session("admin");
    send(&service, &uri, "alice", "r1").await;
    send(&service, &uri, "bob", "r2").await;
    send(&service, &uri, "scout", "r3").await;
    service
        .revoke_boost_recipient(&admin, &uri, &profile("bob"))
        .await
        .unwrap();

    let visible = service
        .get_boost_recipients(&admin, &uri, RecipientQuery::default())
        .await
        .unwrap();
    let to: Vec<_> = visible.records.iter().map(|r| r.to.clone()).collect();
    assert_eq!(to, vec![profile("scout"), profile("alice")]);

    let mut everything = RecipientQuery::default();
    everything.filter.include_revoked = true;
    everything.page = PageRequest::first(2);
    let first = service
        .get_boost_recipients(&admin, &uri, everything.clone())
        .await
        .unwrap();
    assert_eq!(first.records.len(), 2);
    assert!(first.has_more);

    everything.page.cursor = first.cursor;
    let second = service
        .get_boost_recipients(&admin, &uri, everything)
        .await
        .unwrap();
    assert_eq!(second.records.len(), 1);
    assert_eq!(second.records[0].to, profile("alice"));

    let bad_cursor = RecipientQuery {
        page: PageRequest::after(2, "garbage"),
        ..RecipientQuery::default()
    };
    assert_matches!(
        service.get_boost_recipients(&admin, &uri, bad_cursor).await,
        Err(BoostError::BadRequest { .. })
    );
}

#[tokio::test]
async fn recipients_with_children_span_the_subtree() {
    let (service, root) = admin_with_boost().await;
    let admin = session("admin");
    let child = service
        .create_child_boost(&admin, &root, named("Child"))
        .await
        .unwrap();
    send(&service, &root, "alice", "r1").await;
    send(&service, &child, "bob", "c1").await;
    send(&service, &child, "alice", "c2").await;

    assert_eq!(service.get_boost_recipient_count(&admin, &root).await.unwrap(), 1);
    assert_eq!(
        service
            .get_boost_recipients_with_children_count(&admin, &root, 1)
            .await
            .unwrap(),
        2
    );
    let page = service
        .get_boost_recipients_with_children(&admin, &root, 1, RecipientQuery::default())
        .await
        .unwrap();
    assert_eq!(page.records.len(), 3);
}

#[tokio::test]
async fn concurrent_issuance_lands_every_record() {
    let service = test_service();
    let names: Vec<String> = (0..10).map(|i| format!("scout-{i}")).collect();
    let mut all: Vec<&str> = names.iter().map(String::as_str).collect();
    all.push("admin");
    register_profiles(&service, &all).await;
    let admin = session("admin");
    let uri = service.create_boost(&admin, named("Badge")).await.unwrap();

    let recipients: Vec<ProfileId> = names.iter().map(|name| profile(name)).collect();
    let issues = recipients
        .iter()
        .map(|recipient| service.issue_boost(&admin, &uri, recipient));
    let results = futures::future::join_all(issues).await;
    assert!(results.iter().all(Result::is_ok));
    assert_eq!(service.get_boost_recipient_count(&admin, &uri).await.unwrap(), 10);
}

#[tokio::test]
async fn analytics_need_view_analytics() {
    let (service, uri) = admin_with_boost().await;
    send(&service, &uri, "scout", "a1").await;
    service
        .accept_credential(&session("scout"), &CredentialRef::new(TEST_DOMAIN, "a1"))
        .await
        .unwrap();
    send(&service, &uri, "alice", "a2").await;

    let totals = service
        .get_boost_analytics(&session("admin"), &uri)
        .await
        .unwrap();
    assert_eq!(totals.total_issued, 2);
    assert_eq!(totals.claimed, 1);
    assert_eq!(totals.pending, 1);
    assert_eq!(totals.distinct_recipients, 2);

    assert_matches!(
        service.get_boost_analytics(&session("bob"), &uri).await,
        Err(BoostError::Unauthorized { .. })
    );
}

#[tokio::test]
async fn claim_permissions_last_as_long_as_the_credential() {
    let service = test_service();
    register_profiles(&service, &["admin", "scout"]).await;
    let admin = session("admin");
    let request = CreateBoost {
        claim_permissions: Some(PermissionSet {
            can_view_analytics: true,
            ..PermissionSet::empty()
        }),
        ..named("Member card")
    };
    let uri = service.create_boost(&admin, request).await.unwrap();
    send(&service, &uri, "scout", "m1").await;

    let scout = session("scout");
    assert!(service.get_boost_analytics(&scout, &uri).await.is_err());
    service
        .accept_credential(&scout, &CredentialRef::new(TEST_DOMAIN, "m1"))
        .await
        .unwrap();
    service.get_boost_analytics(&scout, &uri).await.unwrap();

    service
        .revoke_boost_recipient(&admin, &uri, &profile("scout"))
        .await
        .unwrap();
    assert_matches!(
        service.get_boost_analytics(&scout, &uri).await,
        Err(BoostError::Unauthorized { .. })
    );
}

// ============================================================================
// Claim hooks
// ============================================================================

#[tokio::test]
async fn claim_hooks_are_listed_and_deleted() {
    let (service, claim) = admin_with_boost().await;
    let admin = session("admin");
    let target = service.create_boost(&admin, named("Target")).await.unwrap();
    let request = NewClaimHook {
        claim_uri: claim.clone(),
        target_uri: target.clone(),
        kind: HookKind::AddAdmin,
    };

    assert_matches!(
        service
            .create_claim_hook(&session("alice"), request.clone())
            .await,
        Err(BoostError::Unauthorized { .. })
    );
    let id = service.create_claim_hook(&admin, request).await.unwrap();

    let hooks = service
        .get_claim_hooks_for_boost(&session("alice"), &claim)
        .await
        .unwrap();
    assert_eq!(hooks.len(), 1);
    assert_eq!(hooks[0].id, id);
    assert_eq!(hooks[0].target_uri, target);
    assert!(service
        .get_claim_hooks_for_boost(&admin, &target)
        .await
        .unwrap()
        .is_empty());

    assert_matches!(
        service.delete_claim_hook(&session("alice"), &id).await,
        Err(BoostError::Unauthorized { .. })
    );
    assert!(service.delete_claim_hook(&admin, &id).await.unwrap());
    assert_matches!(
        service.delete_claim_hook(&admin, &id).await,
        Err(BoostError::NotFound { .. })
    );
}

#[tokio::test]
async fn hook_limit_comes_from_config() {
    let service = test_service_with(BoostServiceConfig {
        max_hooks_per_boost: 1,
        ..test_config()
    });
    register_profiles(&service, &["admin"]).await;
    let admin = session("admin");
    let claim = service.create_boost(&admin, named("Claim")).await.unwrap();
    let first = service.create_boost(&admin, named("First")).await.unwrap();
    let second = service.create_boost(&admin, named("Second")).await.unwrap();

    let hook = |target: &BoostUri| NewClaimHook {
        claim_uri: claim.clone(),
        target_uri: target.clone(),
        kind: HookKind::AddAdmin,
    };
    service.create_claim_hook(&admin, hook(&first)).await.unwrap();
    assert_matches!(
        service.create_claim_hook(&admin, hook(&second)).await,
        Err(BoostError::BadRequest { .. })
    );
}
