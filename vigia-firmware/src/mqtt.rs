//! MQTT broker transport
//!
//! DNS and TCP come from embassy-net, MQTT v5 framing from `rust-mqtt`.
//! Socket and packet buffers live in one static [`SessionBuffers`] owned by
//! the connector; a session borrows them, so there is never more than one.

use core::net::Ipv4Addr;

use defmt::*;
use embassy_net::dns::DnsQueryType;
use embassy_net::tcp::TcpSocket;
use embassy_net::{IpAddress, IpEndpoint, Stack};
use embassy_time::{with_timeout, Duration};
use heapless::String;
use rust_mqtt::client::client::MqttClient;
use rust_mqtt::client::client_config::{ClientConfig, MqttVersion};
use rust_mqtt::packet::v5::publish_packet::QualityOfService;
use rust_mqtt::packet::v5::reason_codes::ReasonCode;
use rust_mqtt::utils::rng_generator::CountingRng;

use vigia_core::config::{BrokerConfig, MAX_CLIENT_ID_LEN};
use vigia_core::traits::{
    BrokerConnector, BrokerSession, ConnectError, PublishError, ResolveError,
};

const TCP_BUFFER_LEN: usize = 1024;

/// Largest MQTT packet: topic (128) + payload (256) + headers and properties
const MQTT_BUFFER_LEN: usize = 512;

/// Properties per packet kept by rust-mqtt
const MAX_PROPERTIES: usize = 5;

const DNS_TIMEOUT: Duration = Duration::from_secs(5);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const PING_TIMEOUT: Duration = Duration::from_secs(5);

/// Unacknowledged data older than this closes the socket
const SOCKET_TIMEOUT: Duration = Duration::from_secs(10);

/// Buffers for one broker session
pub struct SessionBuffers {
    tcp_rx: [u8; TCP_BUFFER_LEN],
    tcp_tx: [u8; TCP_BUFFER_LEN],
    mqtt_tx: [u8; MQTT_BUFFER_LEN],
    mqtt_rx: [u8; MQTT_BUFFER_LEN],
}

impl SessionBuffers {
    pub const fn new() -> Self {
        Self {
            tcp_rx: [0; TCP_BUFFER_LEN],
            tcp_tx: [0; TCP_BUFFER_LEN],
            mqtt_tx: [0; MQTT_BUFFER_LEN],
            mqtt_rx: [0; MQTT_BUFFER_LEN],
        }
    }
}

/// Opens MQTT sessions over the embassy-net stack
pub struct MqttConnector {
    stack: Stack<'static>,
    buffers: &'static mut SessionBuffers,
    /// Copy of the identity for the session's lifetime
    client_id: String<MAX_CLIENT_ID_LEN>,
}

impl MqttConnector {
    pub fn new(stack: Stack<'static>, buffers: &'static mut SessionBuffers) -> Self {
        Self {
            stack,
            buffers,
            client_id: String::new(),
        }
    }
}

/// A connected MQTT client
pub struct MqttSession<'a> {
    client: MqttClient<'a, TcpSocket<'a>, MAX_PROPERTIES, CountingRng>,
}

fn connect_error(code: ReasonCode) -> ConnectError {
    match code {
        ReasonCode::NetworkError => ConnectError::Socket,
        ReasonCode::BuffError | ReasonCode::MalformedPacket | ReasonCode::ProtocolError => {
            ConnectError::Protocol
        }
        code => ConnectError::Refused(u8::from(code)),
    }
}

fn publish_error(code: ReasonCode) -> PublishError {
    match code {
        ReasonCode::NetworkError => PublishError::SessionLost,
        ReasonCode::BuffError => PublishError::Encoding,
        _ => PublishError::Transport,
    }
}

impl BrokerConnector for MqttConnector {
    type Session<'a>
        = MqttSession<'a>
    where
        Self: 'a;

    async fn resolve(&mut self, host: &str) -> Result<Ipv4Addr, ResolveError> {
        let addresses = match with_timeout(DNS_TIMEOUT, self.stack.dns_query(host, DnsQueryType::A))
            .await
        {
            Ok(Ok(addresses)) => addresses,
            Ok(Err(e)) => {
                warn!("DNS query for {} failed: {:?}", host, e);
                return Err(ResolveError::Dns);
            }
            Err(_) => {
                warn!("DNS query for {} timed out", host);
                return Err(ResolveError::Dns);
            }
        };

        match addresses.first() {
            Some(IpAddress::Ipv4(address)) => Ok(*address),
            _ => Err(ResolveError::NoAddress),
        }
    }

    async fn connect(
        &mut self,
        address: Ipv4Addr,
        broker: &BrokerConfig,
    ) -> Result<MqttSession<'_>, ConnectError> {
        self.client_id = broker.client_id.clone();

        let SessionBuffers {
            tcp_rx,
            tcp_tx,
            mqtt_tx,
            mqtt_rx,
        } = &mut *self.buffers;

        let mut socket = TcpSocket::new(self.stack, tcp_rx, tcp_tx);
        socket.set_timeout(Some(SOCKET_TIMEOUT));

        let endpoint = IpEndpoint::new(IpAddress::Ipv4(address), broker.port);
        match with_timeout(CONNECT_TIMEOUT, socket.connect(endpoint)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!("TCP connect to {} failed: {:?}", endpoint, e);
                return Err(ConnectError::Socket);
            }
            Err(_) => return Err(ConnectError::Timeout),
        }

        let mut config: ClientConfig<'_, MAX_PROPERTIES, CountingRng> =
            ClientConfig::new(MqttVersion::MQTTv5, CountingRng(20_000));
        config.add_client_id(&self.client_id);
        config.keep_alive = broker.keep_alive_s;
        config.max_packet_size = MQTT_BUFFER_LEN as u32;

        let mut client = MqttClient::new(
            socket,
            mqtt_tx,
            MQTT_BUFFER_LEN,
            mqtt_rx,
            MQTT_BUFFER_LEN,
            config,
        );

        match with_timeout(CONNECT_TIMEOUT, client.connect_to_broker()).await {
            Ok(Ok(())) => Ok(MqttSession { client }),
            Ok(Err(code)) => {
                warn!("Broker rejected CONNECT: {:?}", Debug2Format(&code));
                Err(connect_error(code))
            }
            Err(_) => Err(ConnectError::Timeout),
        }
    }
}

impl BrokerSession for MqttSession<'_> {
    async fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), PublishError> {
        self.client
            .send_message(topic, payload, QualityOfService::QoS0, false)
            .await
            .map_err(|code| {
                debug!("PUBLISH failed: {:?}", Debug2Format(&code));
                publish_error(code)
            })
    }

    async fn ping(&mut self) -> Result<(), PublishError> {
        match with_timeout(PING_TIMEOUT, self.client.send_ping()).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(code)) => {
                debug!("PINGREQ failed: {:?}", Debug2Format(&code));
                Err(publish_error(code))
            }
            // No PINGRESP: treat the broker as gone
            Err(_) => Err(PublishError::SessionLost),
        }
    }
}
