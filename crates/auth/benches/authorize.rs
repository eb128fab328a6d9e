use chrono::{Duration, Utc};
use criterion::{Criterion, black_box, criterion_group, criterion_main};

use gatehouse_auth::{AuthorizationEngine, IdentityClaims, Permission, Role};
use gatehouse_core::{TenantId, UserId};

fn bench_authorize(c: &mut Criterion) {
    let engine = AuthorizationEngine::default();
    let now = Utc::now();
    let subject = UserId::new();
    let admin = IdentityClaims::issue(subject, TenantId::new(), Role::PLATFORM_ADMIN, now, Duration::hours(1)).expect("valid ttl");
    let user = IdentityClaims::issue(subject, TenantId::new(), Role::USER, now, Duration::hours(1)).expect("valid ttl");

    c.bench_function("authorize_admin_generic", |b| {
        b.iter(|| {
            engine.authorize(
                black_box(Some(&admin)),
                black_box(&[Permission::UpdateUser]),
                black_box(Some(UserId::new())),
                now,
            )
        })
    });

    c.bench_function("authorize_user_ownership", |b| {
        b.iter(|| {
            engine.authorize(
                black_box(Some(&user)),
                black_box(&[Permission::UpdateUser]),
                black_box(Some(subject)),
                now,
            )
        })
    });

    c.bench_function("authorize_user_forbidden", |b| {
        let other = UserId::new();
        b.iter(|| {
            engine.authorize(
                black_box(Some(&user)),
                black_box(&[Permission::DeleteUser]),
                black_box(Some(other)),
                now,
            )
        })
    });
}

criterion_group!(benches, bench_authorize);
criterion_main!(benches);
