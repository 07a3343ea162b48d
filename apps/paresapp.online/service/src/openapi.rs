use serde_json::{Map, Value, json};

pub const ROUTE_HEALTHZ: &str = "/healthz";
pub const ROUTE_OPENAPI_JSON: &str = "/openapi.json";
pub const ROUTE_AUTH_LOGIN: &str = "/api/auth/login";
pub const ROUTE_AUTH_REGISTER: &str = "/api/auth/register";
pub const ROUTE_AUTH_LOGOUT: &str = "/api/auth/logout";
pub const ROUTE_AUTH_ME: &str = "/api/auth/me";
pub const ROUTE_CATEGORIES: &str = "/api/categories";
pub const ROUTE_PACKAGES: &str = "/api/packages";
pub const ROUTE_PACKAGES_BY_ID: &str = "/api/packages/:id";
pub const ROUTE_CUSTOMER_PURCHASES: &str = "/api/customer/purchases";
pub const ROUTE_PROVIDER_PACKAGES: &str = "/api/provider/packages";
pub const ROUTE_PROVIDER_STATS: &str = "/api/provider/stats";
pub const ROUTE_PROVIDER_PROFILE: &str = "/api/provider/profile";
pub const ROUTE_PROVIDER_SETTINGS: &str = "/api/provider/settings";
pub const ROUTE_PROFILE: &str = "/api/profile";
pub const ROUTE_SETTINGS: &str = "/api/settings";
pub const ROUTE_APPOINTMENTS: &str = "/api/appointments";
pub const ROUTE_APPOINTMENTS_BY_ID: &str = "/api/appointments/:id";
pub const ROUTE_MESSAGES: &str = "/api/messages";
pub const ROUTE_ADMIN_USERS: &str = "/api/admin/users";
pub const ROUTE_ADMIN_STATS: &str = "/api/admin/stats";
pub const ROUTE_ADMIN_TRANSACTIONS: &str = "/api/admin/transactions";
pub const ROUTE_ADMIN_COMMISSION: &str = "/api/admin/commission";

#[derive(Clone, Copy)]
struct OpenApiContract {
    method: &'static str,
    route_path: &'static str,
    operation_id: &'static str,
    summary: &'static str,
    tag: &'static str,
    secured: bool,
    success_status: &'static str,
    request_example: Option<&'static str>,
    query: &'static [&'static str],
}

const OPENAPI_CONTRACTS: &[OpenApiContract] = &[
    OpenApiContract {
        method: "get",
        route_path: ROUTE_HEALTHZ,
        operation_id: "health",
        summary: "Liveness probe with build and uptime details.",
        tag: "ops",
        secured: false,
        success_status: "200",
        request_example: None,
        query: &[],
    },
    OpenApiContract {
        method: "post",
        route_path: ROUTE_AUTH_LOGIN,
        operation_id: "authLogin",
        summary: "Exchange email and password for a session cookie.",
        tag: "auth",
        secured: false,
        success_status: "200",
        request_example: Some("auth_login"),
        query: &[],
    },
    OpenApiContract {
        method: "post",
        route_path: ROUTE_AUTH_REGISTER,
        operation_id: "authRegister",
        summary: "Create a customer or service provider account.",
        tag: "auth",
        secured: false,
        success_status: "201",
        request_example: Some("auth_register"),
        query: &[],
    },
    OpenApiContract {
        method: "post",
        route_path: ROUTE_AUTH_LOGOUT,
        operation_id: "authLogout",
        summary: "Clear the session cookie.",
        tag: "auth",
        secured: false,
        success_status: "200",
        request_example: None,
        query: &[],
    },
    OpenApiContract {
        method: "get",
        route_path: ROUTE_AUTH_ME,
        operation_id: "authMe",
        summary: "Current account, re-read from the user directory.",
        tag: "auth",
        secured: true,
        success_status: "200",
        request_example: None,
        query: &[],
    },
    OpenApiContract {
        method: "get",
        route_path: ROUTE_CATEGORIES,
        operation_id: "categoriesList",
        summary: "Active service categories.",
        tag: "catalog",
        secured: false,
        success_status: "200",
        request_example: None,
        query: &[],
    },
    OpenApiContract {
        method: "get",
        route_path: ROUTE_PACKAGES,
        operation_id: "packagesSearch",
        summary: "Browse active packages with optional filters.",
        tag: "catalog",
        secured: false,
        success_status: "200",
        request_example: None,
        query: &["category", "search", "featured", "minPrice", "maxPrice"],
    },
    OpenApiContract {
        method: "get",
        route_path: ROUTE_PACKAGES_BY_ID,
        operation_id: "packagesShow",
        summary: "Package detail with provider, category and live promotions.",
        tag: "catalog",
        secured: false,
        success_status: "200",
        request_example: None,
        query: &[],
    },
    OpenApiContract {
        method: "get",
        route_path: ROUTE_CUSTOMER_PURCHASES,
        operation_id: "customerPurchasesList",
        summary: "Purchases owned by the signed-in customer, newest first.",
        tag: "customer",
        secured: true,
        success_status: "200",
        request_example: None,
        query: &[],
    },
    OpenApiContract {
        method: "post",
        route_path: ROUTE_CUSTOMER_PURCHASES,
        operation_id: "customerPurchasesCreate",
        summary: "Buy a package, optionally applying a live promotion.",
        tag: "customer",
        secured: true,
        success_status: "201",
        request_example: Some("purchase_create"),
        query: &[],
    },
    OpenApiContract {
        method: "get",
        route_path: ROUTE_PROVIDER_PACKAGES,
        operation_id: "providerPackagesList",
        summary: "Packages owned by the signed-in provider.",
        tag: "provider",
        secured: true,
        success_status: "200",
        request_example: None,
        query: &[],
    },
    OpenApiContract {
        method: "post",
        route_path: ROUTE_PROVIDER_PACKAGES,
        operation_id: "providerPackagesCreate",
        summary: "Publish a new package.",
        tag: "provider",
        secured: true,
        success_status: "201",
        request_example: Some("package_create"),
        query: &[],
    },
    OpenApiContract {
        method: "get",
        route_path: ROUTE_PROVIDER_STATS,
        operation_id: "providerStats",
        summary: "Sales, session and rating figures for the signed-in provider.",
        tag: "provider",
        secured: true,
        success_status: "200",
        request_example: None,
        query: &[],
    },
    OpenApiContract {
        method: "get",
        route_path: ROUTE_PROVIDER_PROFILE,
        operation_id: "providerProfileShow",
        summary: "Provider profile page fields.",
        tag: "provider",
        secured: true,
        success_status: "200",
        request_example: None,
        query: &[],
    },
    OpenApiContract {
        method: "put",
        route_path: ROUTE_PROVIDER_PROFILE,
        operation_id: "providerProfileUpdate",
        summary: "Update provider profile fields.",
        tag: "provider",
        secured: true,
        success_status: "200",
        request_example: Some("profile_update"),
        query: &[],
    },
    OpenApiContract {
        method: "get",
        route_path: ROUTE_PROVIDER_SETTINGS,
        operation_id: "providerSettingsShow",
        summary: "Booking, notification and payout settings.",
        tag: "provider",
        secured: true,
        success_status: "200",
        request_example: None,
        query: &[],
    },
    OpenApiContract {
        method: "put",
        route_path: ROUTE_PROVIDER_SETTINGS,
        operation_id: "providerSettingsUpdate",
        summary: "Replace provider settings.",
        tag: "provider",
        secured: true,
        success_status: "200",
        request_example: None,
        query: &[],
    },
    OpenApiContract {
        method: "get",
        route_path: ROUTE_PROFILE,
        operation_id: "profileShow",
        summary: "Customer profile page fields.",
        tag: "account",
        secured: true,
        success_status: "200",
        request_example: None,
        query: &[],
    },
    OpenApiContract {
        method: "put",
        route_path: ROUTE_PROFILE,
        operation_id: "profileUpdate",
        summary: "Update profile fields.",
        tag: "account",
        secured: true,
        success_status: "200",
        request_example: Some("profile_update"),
        query: &[],
    },
    OpenApiContract {
        method: "get",
        route_path: ROUTE_SETTINGS,
        operation_id: "settingsShow",
        summary: "Notification, privacy and payment preferences.",
        tag: "account",
        secured: true,
        success_status: "200",
        request_example: None,
        query: &[],
    },
    OpenApiContract {
        method: "put",
        route_path: ROUTE_SETTINGS,
        operation_id: "settingsUpdate",
        summary: "Replace account preferences.",
        tag: "account",
        secured: true,
        success_status: "200",
        request_example: None,
        query: &[],
    },
    OpenApiContract {
        method: "get",
        route_path: ROUTE_APPOINTMENTS,
        operation_id: "appointmentsList",
        summary: "Appointments, or open slots when providerId and date are given.",
        tag: "appointments",
        secured: true,
        success_status: "200",
        request_example: None,
        query: &["providerId", "customerId", "date"],
    },
    OpenApiContract {
        method: "post",
        route_path: ROUTE_APPOINTMENTS,
        operation_id: "appointmentsCreate",
        summary: "Book an appointment in pending status.",
        tag: "appointments",
        secured: true,
        success_status: "201",
        request_example: Some("appointment_create"),
        query: &[],
    },
    OpenApiContract {
        method: "patch",
        route_path: ROUTE_APPOINTMENTS_BY_ID,
        operation_id: "appointmentsUpdate",
        summary: "Change an appointment's status or notes.",
        tag: "appointments",
        secured: true,
        success_status: "200",
        request_example: Some("appointment_update"),
        query: &[],
    },
    OpenApiContract {
        method: "delete",
        route_path: ROUTE_APPOINTMENTS_BY_ID,
        operation_id: "appointmentsCancel",
        summary: "Cancel an appointment and free its slot.",
        tag: "appointments",
        secured: true,
        success_status: "200",
        request_example: None,
        query: &[],
    },
    OpenApiContract {
        method: "get",
        route_path: ROUTE_MESSAGES,
        operation_id: "messagesList",
        summary: "Conversations for a user, or messages when conversationId is given.",
        tag: "messages",
        secured: true,
        success_status: "200",
        request_example: None,
        query: &["conversationId", "userId"],
    },
    OpenApiContract {
        method: "post",
        route_path: ROUTE_MESSAGES,
        operation_id: "messagesSend",
        summary: "Send a message, opening a conversation when none is given.",
        tag: "messages",
        secured: true,
        success_status: "201",
        request_example: Some("message_send"),
        query: &[],
    },
    OpenApiContract {
        method: "get",
        route_path: ROUTE_ADMIN_USERS,
        operation_id: "adminUsersList",
        summary: "Users with provider and spending summaries.",
        tag: "admin",
        secured: true,
        success_status: "200",
        request_example: None,
        query: &["userType", "search", "status"],
    },
    OpenApiContract {
        method: "patch",
        route_path: ROUTE_ADMIN_USERS,
        operation_id: "adminUsersUpdate",
        summary: "Activate, deactivate, verify or unverify an account.",
        tag: "admin",
        secured: true,
        success_status: "200",
        request_example: Some("admin_user_action"),
        query: &[],
    },
    OpenApiContract {
        method: "get",
        route_path: ROUTE_ADMIN_STATS,
        operation_id: "adminStats",
        summary: "Marketplace totals, growth and category shares.",
        tag: "admin",
        secured: true,
        success_status: "200",
        request_example: None,
        query: &[],
    },
    OpenApiContract {
        method: "get",
        route_path: ROUTE_ADMIN_TRANSACTIONS,
        operation_id: "adminTransactionsList",
        summary: "Platform revenue ledger, newest first.",
        tag: "admin",
        secured: true,
        success_status: "200",
        request_example: None,
        query: &["type", "status"],
    },
    OpenApiContract {
        method: "get",
        route_path: ROUTE_ADMIN_COMMISSION,
        operation_id: "adminCommissionShow",
        summary: "Commission rates and platform fees.",
        tag: "admin",
        secured: true,
        success_status: "200",
        request_example: None,
        query: &[],
    },
    OpenApiContract {
        method: "put",
        route_path: ROUTE_ADMIN_COMMISSION,
        operation_id: "adminCommissionUpdate",
        summary: "Merge and validate commission settings.",
        tag: "admin",
        secured: true,
        success_status: "200",
        request_example: Some("commission_update"),
        query: &[],
    },
];

pub fn openapi_document() -> Value {
    let mut paths = Map::new();
    for contract in OPENAPI_CONTRACTS {
        add_operation(&mut paths, contract);
    }

    json!({
        "openapi": "3.0.2",
        "info": {
            "title": "PARES Marketplace API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Package marketplace API: catalogue, purchases, appointments, messaging and administration."
        },
        "servers": [
            { "url": "https://paresapp.online" }
        ],
        "paths": Value::Object(paths),
        "components": {
            "securitySchemes": {
                "bearerAuth": {
                    "type": "http",
                    "scheme": "bearer",
                    "bearerFormat": "JWT"
                },
                "sessionCookie": {
                    "type": "apiKey",
                    "in": "cookie",
                    "name": "auth-token"
                }
            },
            "schemas": {
                "ApiDataEnvelope": {
                    "type": "object",
                    "properties": {
                        "data": { "type": "object", "additionalProperties": true }
                    },
                    "required": ["data"]
                },
                "ApiErrorResponse": {
                    "type": "object",
                    "properties": {
                        "message": { "type": "string" },
                        "error": {
                            "type": "object",
                            "properties": {
                                "code": { "type": "string" },
                                "message": { "type": "string" }
                            },
                            "required": ["code", "message"]
                        },
                        "errors": {
                            "type": "object",
                            "additionalProperties": {
                                "type": "array",
                                "items": { "type": "string" }
                            }
                        }
                    },
                    "required": ["message", "error"]
                }
            },
            "responses": {
                "ErrorEnvelope": {
                    "description": "Error response envelope",
                    "content": {
                        "application/json": {
                            "schema": { "$ref": "#/components/schemas/ApiErrorResponse" },
                            "example": {
                                "message": "Unauthenticated.",
                                "error": {
                                    "code": "unauthorized",
                                    "message": "Unauthenticated."
                                }
                            }
                        }
                    }
                }
            }
        }
    })
}

fn add_operation(paths: &mut Map<String, Value>, contract: &OpenApiContract) {
    let path = to_openapi_path(contract.route_path);

    let mut operation = json!({
        "operationId": contract.operation_id,
        "summary": contract.summary,
        "tags": [contract.tag],
        "responses": {
            contract.success_status: {
                "description": "Success",
                "content": {
                    "application/json": {
                        "schema": { "$ref": "#/components/schemas/ApiDataEnvelope" }
                    }
                }
            },
            "default": { "$ref": "#/components/responses/ErrorEnvelope" }
        },
    });

    if contract.secured {
        operation["security"] = json!([{"bearerAuth": []}, {"sessionCookie": []}]);
    }

    if let Some(example_key) = contract.request_example {
        let mut request_body = json!({
            "required": true,
            "content": {
                "application/json": {
                    "schema": { "type": "object", "additionalProperties": true }
                }
            }
        });
        if let Some(example) = request_example(example_key) {
            request_body["content"]["application/json"]["example"] = example;
        }
        operation["requestBody"] = request_body;
    }

    let mut parameters = path_parameters(contract.route_path);
    parameters.extend(contract.query.iter().map(|name| {
        json!({
            "name": name,
            "in": "query",
            "required": false,
            "schema": {"type": "string"}
        })
    }));
    if !parameters.is_empty() {
        operation["parameters"] = Value::Array(parameters);
    }

    let path_item = paths
        .entry(path)
        .or_insert_with(|| Value::Object(Map::new()));
    if let Some(item) = path_item.as_object_mut() {
        item.insert(contract.method.to_string(), operation);
    }
}

fn to_openapi_path(route_path: &str) -> String {
    route_path
        .split('/')
        .map(|segment| match segment.strip_prefix(':') {
            Some(parameter) => format!("{{{parameter}}}"),
            None => segment.to_string(),
        })
        .collect::<Vec<String>>()
        .join("/")
}

fn path_parameters(route_path: &str) -> Vec<Value> {
    route_path
        .split('/')
        .filter_map(|segment| segment.strip_prefix(':'))
        .map(|parameter| {
            json!({
                "name": parameter,
                "in": "path",
                "required": true,
                "schema": {"type": "string"}
            })
        })
        .collect()
}

fn request_example(key: &str) -> Option<Value> {
    match key {
        "auth_login" => Some(json!({
            "email": "customer@example.com",
            "password": "customer123"
        })),
        "auth_register" => Some(json!({
            "email": "elif@example.com",
            "password": "secret123",
            "firstName": "Elif",
            "lastName": "Aydın",
            "userType": "service_provider",
            "phone": "+90 555 765 4321"
        })),
        "purchase_create" => Some(json!({
            "packageId": "pkg_pilates_8",
            "promotionId": "promo_pilates_spring"
        })),
        "package_create" => Some(json!({
            "title": "4 Seans Mat Pilates",
            "description": "Grup mat pilates dersleri.",
            "categoryId": "cat_fitness",
            "price": 800,
            "sessionCount": 4,
            "durationMinutes": 45,
            "validityDays": 30
        })),
        "profile_update" => Some(json!({
            "firstName": "Mehmet",
            "city": "İzmir",
            "interests": ["pilates", "yoga"]
        })),
        "appointment_create" => Some(json!({
            "packagePurchaseId": "pur_mehmet_pilates",
            "customerId": "usr_customer_mehmet",
            "serviceProviderId": "sp_ayse",
            "appointmentDate": "2026-03-02",
            "startTime": "09:00",
            "endTime": "09:50",
            "notes": "İlk ders"
        })),
        "appointment_update" => Some(json!({
            "status": "confirmed",
            "notes": "Onaylandı"
        })),
        "message_send" => Some(json!({
            "conversationId": "conv_mehmet_ayse",
            "senderId": "usr_customer_mehmet",
            "receiverId": "usr_provider_ayse",
            "content": "Yarın görüşürüz."
        })),
        "admin_user_action" => Some(json!({
            "userId": "usr_provider_can",
            "action": "verify"
        })),
        "commission_update" => Some(json!({
            "defaultRate": 12,
            "customRates": [
                { "serviceProviderId": "sp_can", "rate": 8, "reason": "Launch partner" }
            ]
        })),
        _ => None,
    }
}
