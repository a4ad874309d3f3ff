use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tracing::info;

use crate::handlers::api::{
    cancel_turno, create_empresa, delete_empresa, get_availability, get_empresa,
    list_categorias, list_empresas, list_empresas_by_categoria, login, logout, mis_turnos,
    register, reserve_turno, update_empresa, AppState,
};
use crate::handlers::health::health_check;

pub fn create_router(app_state: Arc<AppState>, admin_enabled: bool) -> Router {
    let mut router = Router::new();

    // Health check is always available
    let health_route = Router::new().route("/health", get(health_check));
    router = router.merge(health_route);

    // Catalog and availability, no session needed
    let catalog_routes = Router::new()
        .route("/api/categorias", get(list_categorias))
        .route("/api/categorias/:id/empresas", get(list_empresas_by_categoria))
        .route("/api/empresas", get(list_empresas))
        .route("/api/empresas/:id", get(get_empresa))
        .route("/api/empresas/:id/turnos", get(get_availability));
    router = router.merge(catalog_routes);

    let auth_routes = Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/register", post(register))
        .route("/api/auth/logout", post(logout));
    router = router.merge(auth_routes);

    let booking_routes = Router::new()
        .route("/api/turnos/reservar", post(reserve_turno))
        .route("/api/turnos/mis-turnos", get(mis_turnos))
        .route("/api/turnos/cancelar/:id", delete(cancel_turno));
    router = router.merge(booking_routes);

    if admin_enabled {
        let admin_routes = Router::new()
            .route("/api/admin/empresas", post(create_empresa))
            .route(
                "/api/admin/empresas/:id",
                put(update_empresa).delete(delete_empresa),
            );
        router = router.merge(admin_routes);

        info!("Admin routes enabled");
    } else {
        info!("Admin routes disabled");
    }

    router.with_state(app_state)
}
