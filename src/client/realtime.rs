//! Websocket connection to `/api/realtime`.

use super::ClientError;
use crate::realtime::{ClientMessage, ServerMessage, Topic, TypingPayload, TYPING_EVENT};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub struct RealtimeConnection {
    sink: SplitSink<Socket, Message>,
    stream: SplitStream<Socket>,
}

impl RealtimeConnection {
    pub async fn connect(url: &str, token: &str) -> Result<Self, ClientError> {
        let mut request = url.into_client_request()?;
        let bearer = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|err| ClientError::Realtime(err.to_string()))?;
        request.headers_mut().insert("Authorization", bearer);

        let (socket, _) = connect_async(request).await?;
        tracing::debug!("realtime connected to {}", url);
        let (sink, stream) = socket.split();
        Ok(Self { sink, stream })
    }

    async fn send(&mut self, message: &ClientMessage) -> Result<(), ClientError> {
        let text = serde_json::to_string(message)
            .map_err(|err| ClientError::Realtime(err.to_string()))?;
        self.sink.send(Message::Text(text)).await?;
        Ok(())
    }

    pub async fn subscribe(&mut self, topic: Topic) -> Result<(), ClientError> {
        self.send(&ClientMessage::Subscribe {
            topic: topic.to_string(),
        })
        .await
    }

    pub async fn unsubscribe(&mut self, topic: Topic) -> Result<(), ClientError> {
        self.send(&ClientMessage::Unsubscribe {
            topic: topic.to_string(),
        })
        .await
    }

    pub async fn send_typing(&mut self, payload: &TypingPayload) -> Result<(), ClientError> {
        let topic = Topic::Ticket(payload.ticket_id).to_string();
        let payload = serde_json::to_value(payload)
            .map_err(|err| ClientError::Realtime(err.to_string()))?;
        self.send(&ClientMessage::Broadcast {
            topic,
            event: TYPING_EVENT.to_string(),
            payload,
        })
        .await
    }

    /// Next server frame. `None` once the server closed the connection.
    pub async fn next_message(&mut self) -> Option<Result<ServerMessage, ClientError>> {
        while let Some(frame) = self.stream.next().await {
            match frame {
                Ok(Message::Text(text)) => {
                    return Some(
                        serde_json::from_str::<ServerMessage>(&text)
                            .map_err(|err| ClientError::Realtime(err.to_string())),
                    )
                }
                Ok(Message::Close(_)) => return None,
                Ok(_) => continue,
                Err(err) => return Some(Err(err.into())),
            }
        }
        None
    }

    pub async fn close(mut self) -> Result<(), ClientError> {
        self.sink.send(Message::Close(None)).await?;
        Ok(())
    }
}
