use std::sync::OnceLock;

use anyhow::Context;
use warden_client::entities::{
  config::{
    AuthConfig, CoreConfig, DatabaseConfig, Env,
    RelationshipStoreConfig,
  },
  logger::LogConfig,
};

pub fn core_config() -> &'static CoreConfig {
  static CORE_CONFIG: OnceLock<CoreConfig> = OnceLock::new();
  CORE_CONFIG.get_or_init(|| {
    let env: Env = match envy::from_env()
      .context("Failed to parse Warden Core environment")
    {
      Ok(env) => env,
      Err(e) => {
        panic!("{e:?}");
      }
    };

    let config = match &env.warden_config_path {
      Some(path) => {
        let contents = std::fs::read_to_string(path)
          .unwrap_or_else(|e| {
            panic!("failed to read config file at {path} | {e:?}")
          });
        toml::from_str::<CoreConfig>(&contents).unwrap_or_else(|e| {
          panic!("failed to parse config file at {path} | {e:?}")
        })
      }
      None => CoreConfig::default(),
    };

    // Recreating CoreConfig here makes sure all env overrides are applied.
    CoreConfig {
      bind_ip: env.warden_bind_ip.unwrap_or(config.bind_ip),
      port: env.warden_port.unwrap_or(config.port),
      auth: AuthConfig {
        mode: env.warden_auth_mode.unwrap_or(config.auth.mode),
        subject_header: env
          .warden_subject_header
          .unwrap_or(config.auth.subject_header),
        jwt_secret: env
          .warden_jwt_secret
          .unwrap_or(config.auth.jwt_secret),
      },
      super_admins: env
        .warden_super_admins
        .unwrap_or(config.super_admins),
      enforce_authorization: env
        .warden_enforce_authorization
        .unwrap_or(config.enforce_authorization),
      require_role_use_permission: env
        .warden_require_role_use_permission
        .unwrap_or(config.require_role_use_permission),
      database: DatabaseConfig {
        uri: env.warden_database_uri.unwrap_or(config.database.uri),
        address: env
          .warden_database_address
          .unwrap_or(config.database.address),
        username: env
          .warden_database_username
          .unwrap_or(config.database.username),
        password: env
          .warden_database_password
          .unwrap_or(config.database.password),
        app_name: env
          .warden_database_app_name
          .unwrap_or(config.database.app_name),
        db_name: env
          .warden_database_db_name
          .unwrap_or(config.database.db_name),
      },
      relationship: RelationshipStoreConfig {
        backend: env
          .warden_relationship_backend
          .unwrap_or(config.relationship.backend),
        openfga_url: env
          .warden_openfga_url
          .unwrap_or(config.relationship.openfga_url),
        openfga_store: env
          .warden_openfga_store
          .unwrap_or(config.relationship.openfga_store),
        openfga_token: env
          .warden_openfga_token
          .unwrap_or(config.relationship.openfga_token),
      },
      logging: LogConfig {
        level: env
          .warden_logging_level
          .unwrap_or(config.logging.level),
        stdio: env
          .warden_logging_stdio
          .unwrap_or(config.logging.stdio),
        pretty: env
          .warden_logging_pretty
          .unwrap_or(config.logging.pretty),
        otlp_endpoint: env
          .warden_logging_otlp_endpoint
          .unwrap_or(config.logging.otlp_endpoint),
        opentelemetry_service_name: env
          .warden_logging_opentelemetry_service_name
          .unwrap_or(config.logging.opentelemetry_service_name),
      },
      ssl_enabled: env
        .warden_ssl_enabled
        .unwrap_or(config.ssl_enabled),
      ssl_cert_file: env
        .warden_ssl_cert_file
        .unwrap_or(config.ssl_cert_file),
      ssl_key_file: env
        .warden_ssl_key_file
        .unwrap_or(config.ssl_key_file),
    }
  })
}
