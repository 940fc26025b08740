// handlers/mod.rs - Route handlers
//
// Every handler runs behind the request gate, so none of them re-check the
// session or the HTTP method. Public routes (identity provider, sign-in page)
// are exempted by the gate's route table, not here.
pub mod auth;     // /api/auth/* - sign-in, OAuth callback, sign-out
pub mod backups;  // /api/backups/* - archive list/create/delete/download
pub mod pages;    // /, /auth/signin and the 404 fallback
pub mod process;  // /api/pm2/status - bot process health

/*
HANDLER ORGANIZATION:

src/handlers/
├── mod.rs             ← This file
├── auth/
│   ├── signin.rs      ← GET /api/auth/signin
│   ├── callback.rs    ← GET /api/auth/callback/:provider
│   └── signout.rs     ← GET|POST /api/auth/signout
├── backups/
│   ├── list.rs        ← GET /api/backups/list
│   ├── create.rs      ← POST /api/backups/create
│   ├── delete.rs      ← DELETE /api/backups/delete?key=
│   └── download.rs    ← GET /api/backups/download?key=
├── process/
│   └── status.rs      ← GET /api/pm2/status
└── pages.rs           ← HTML shell pages

Declared methods live in middleware/routes.rs; the router in server.rs
registers each handler under the same method so both agree.
*/
