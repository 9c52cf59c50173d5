use log::warn;

use crate::{
    connection::{DirectConnection, GatewayError},
    model::param::{PriceEntry, Scheme, Weather},
};

/// 侧边栏只读数据：天气、市场价格、补贴方案
#[derive(Clone)]
pub struct DashboardClient {
    connection: DirectConnection,
}

/// 一次拉取到的侧边栏数据，拉取失败的部分为空
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SidebarData {
    pub weather: Option<Weather>,
    pub prices: Vec<PriceEntry>,
    pub schemes: Vec<Scheme>,
}

impl DashboardClient {
    pub fn new(connection: DirectConnection) -> Self {
        Self { connection }
    }

    pub async fn weather(&self, city: &str) -> Result<Weather, GatewayError> {
        self.connection
            .get_json("/dashboard/weather", &[("city", city)])
            .await
    }

    pub async fn prices(&self) -> Result<Vec<PriceEntry>, GatewayError> {
        self.connection.get_json("/dashboard/prices", &[]).await
    }

    pub async fn subsidies(&self, category: Option<&str>) -> Result<Vec<Scheme>, GatewayError> {
        match category {
            Some(category) => {
                self.connection
                    .get_json("/dashboard/subsidies", &[("category", category)])
                    .await
            }
            None => self.connection.get_json("/dashboard/subsidies", &[]).await,
        }
    }

    /// 并发拉取侧边栏数据，任何一项失败只记录日志
    pub async fn sidebar(&self, district: &str) -> SidebarData {
        let (weather, prices, schemes) =
            futures::join!(self.weather(district), self.prices(), self.subsidies(None));
        SidebarData {
            weather: weather
                .map_err(|e| warn!("获取 {} 天气失败: {}", district, e))
                .ok(),
            prices: prices
                .map_err(|e| warn!("获取市场价格失败: {}", e))
                .unwrap_or_default(),
            schemes: schemes
                .map_err(|e| warn!("获取补贴方案失败: {}", e))
                .unwrap_or_default(),
        }
    }
}
