pub mod pacer;
pub mod transport;

pub use pacer::{Pacer, Sleeper, TokioSleeper};
pub use transport::{
    HttpMethod, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport, RequestBody,
};
