//! A throwaway HTTP server for exercising the network code in tests.
//!
//! Each accepted connection gets the next canned response and is then closed.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

pub(crate) struct TestServer {
    listener: TcpListener,
    pub url: String,
}

impl TestServer {
    pub(crate) async fn bind() -> TestServer {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("can bind test server");
        let addr = listener.local_addr().expect("test server has an address");
        TestServer {
            listener,
            url: format!("http://{addr}"),
        }
    }

    pub(crate) fn serve(self, responses: Vec<(u16, Vec<u8>)>) {
        let listener = self.listener;
        tokio::spawn(async move {
            for (status, body) in responses {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                let mut request = vec![0u8; 8192];
                let _ = socket.read(&mut request).await;
                let head = format!(
                    "HTTP/1.1 {status} Test\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    body.len()
                );
                let _ = socket.write_all(head.as_bytes()).await;
                let _ = socket.write_all(&body).await;
                let _ = socket.shutdown().await;
            }
        });
    }
}
