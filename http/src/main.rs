use std::{collections::HashMap, sync::Arc};

use actix_web::{delete, get, post, web, App, HttpResponse, HttpServer, Responder, Scope};
use bytes::Bytes;
use ember_kv::{db::Engine, errors::Errors, option::Options};
use serde_json::json;

#[post("/put")]
async fn put_handler(
  eng: web::Data<Arc<Engine>>,
  data: web::Json<HashMap<String, String>>,
) -> impl Responder {
  for (key, value) in data.iter() {
    if eng
      .put(Bytes::from(key.clone()), Bytes::from(value.clone()))
      .is_err()
    {
      return HttpResponse::InternalServerError().body("failed to put value in engine");
    }
  }
  HttpResponse::Ok().body("OK")
}

#[get("/get/{key}")]
async fn get_handler(eng: web::Data<Arc<Engine>>, key: web::Path<String>) -> impl Responder {
  match eng.get(Bytes::from(key.into_inner())) {
    Ok(value) => HttpResponse::Ok().body(String::from_utf8_lossy(&value).to_string()),
    Err(Errors::KeyNotFound) => HttpResponse::NotFound().body("key not found"),
    Err(_) => HttpResponse::InternalServerError().body("failed to get value from engine"),
  }
}

#[delete("/delete/{key}")]
async fn delete_handler(eng: web::Data<Arc<Engine>>, key: web::Path<String>) -> impl Responder {
  match eng.delete(Bytes::from(key.into_inner())) {
    Ok(()) => HttpResponse::Ok().body("OK"),
    Err(_) => HttpResponse::InternalServerError().body("failed to delete key in engine"),
  }
}

#[get("/listkeys")]
async fn listkeys_handler(eng: web::Data<Arc<Engine>>) -> impl Responder {
  match eng.list_keys() {
    Ok(keys) => {
      let keys: Vec<String> = keys
        .iter()
        .map(|key| String::from_utf8_lossy(key).to_string())
        .collect();
      HttpResponse::Ok().json(keys)
    }
    Err(_) => HttpResponse::InternalServerError().body("failed to list keys in engine"),
  }
}

#[get("/stat")]
async fn stat_handler(eng: web::Data<Arc<Engine>>) -> impl Responder {
  match eng.get_engine_stat() {
    Ok(stat) => HttpResponse::Ok().json(json!({
      "key_num": stat.key_num,
      "data_file_num": stat.data_file_num,
      "disk_size": stat.disk_size,
    })),
    Err(_) => HttpResponse::InternalServerError().body("failed to get engine stat"),
  }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  let mut opts = Options::default();
  opts.dir_path = std::env::temp_dir().join("ember-kv-http");
  let engine = Arc::new(Engine::open(opts).expect("failed to open ember-kv engine"));

  HttpServer::new(move || {
    App::new().app_data(web::Data::new(engine.clone())).service(
      Scope::new("/ember-kv")
        .service(put_handler)
        .service(get_handler)
        .service(delete_handler)
        .service(listkeys_handler)
        .service(stat_handler),
    )
  })
  .bind(("127.0.0.1", 8080))?
  .run()
  .await
}

#[cfg(test)]
mod test;
