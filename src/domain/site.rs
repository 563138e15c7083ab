use serde::{Deserialize, Serialize};

/// Jurisdictions whose branch sites still run the older table-based template.
const SPECIAL_PROVINCES: &[&str] = &[
    "北京市", "天津市", "上海市", "宁波市", "深圳市", "大连市", "青岛市", "厦门市",
];

const BUILTIN_SITES: &[(&str, &str)] = &[
    ("上海市", "https://shanghai.pbc.gov.cn/fzhshanghai/113577/114832/114918/index.html"),
    ("北京市", "https://beijing.pbc.gov.cn/beijing/132030/132052/132059/index.html"),
    ("天津市", "https://tianjin.pbc.gov.cn/fzhtianjin/113682/113700/113707/index.html"),
    ("重庆市", "https://chongqing.pbc.gov.cn/chongqing/107680/107897/107909/index.html"),
    ("深圳市", "https://shenzhen.pbc.gov.cn/shenzhen/122811/122833/122840/index.html"),
    ("大连市", "https://dalian.pbc.gov.cn/dalian/123812/123830/123837/index.html"),
    ("青岛市", "https://qingdao.pbc.gov.cn/qingdao/126166/126184/126191/index.html"),
    ("厦门市", "https://xiamen.pbc.gov.cn/xiamen/127703/127721/127728/index.html"),
    ("宁波市", "https://ningbo.pbc.gov.cn/ningbo/127076/127098/127105/index.html"),
    ("黑龙江省", "https://haerbin.pbc.gov.cn/haerbin/112693/112776/112783/index.html"),
    ("吉林省", "https://changchun.pbc.gov.cn/changchun/124680/124698/124705/index.html"),
    ("辽宁省", "https://shenyang.pbc.gov.cn/shenyfh/108074/108127/108208/index.html"),
    ("河北省", "https://shijiazhuang.pbc.gov.cn/shijiazhuang/131442/131463/131472/index.html"),
    ("河南省", "https://zhengzhou.pbc.gov.cn/zhengzhou/124182/124200/124207/index.html"),
    ("山西省", "https://taiyuan.pbc.gov.cn/taiyuan/133960/133981/133988/index.html"),
    ("山东省", "https://jinan.pbc.gov.cn/jinan/120967/120985/120994/index.html"),
    ("内蒙古自治区", "https://huhehaote.pbc.gov.cn/huhehaote/129797/129815/129822/index.html"),
    ("安徽省", "https://hefei.pbc.gov.cn/hefei/122364/122382/122389/index.html"),
    ("湖北省", "https://wuhan.pbc.gov.cn/wuhan/123472/123493/123502/index.html"),
    ("湖南省", "https://changsha.pbc.gov.cn/changsha/130011/130029/130036/index.html"),
    ("海南省", "https://haikou.pbc.gov.cn/haikou/132982/133000/133007/index.html"),
    ("江苏省", "https://nanjing.pbc.gov.cn/nanjing/117542/117560/117567/index.html"),
    ("江西省", "https://nanchang.pbc.gov.cn/nanchang/132372/132390/132397/index.html"),
    ("浙江省", "https://hangzhou.pbc.gov.cn/hangzhou/125268/125286/125293/index.html"),
    ("广东省", "https://guangzhou.pbc.gov.cn/guangzhou/129142/129159/129166/index.html"),
    ("福建省", "https://fuzhou.pbc.gov.cn/fuzhou/126805/126823/126830/index.html"),
    ("广西壮族自治区", "https://nanning.pbc.gov.cn/nanning/133346/133364/133371/index.html"),
    ("贵州省", "https://guiyang.pbc.gov.cn/guiyang/113288/113306/113313/index.html"),
    ("四川省", "https://chengdu.pbc.gov.cn/chengdu/129320/129341/129350/index.html"),
    ("云南省", "https://kunming.pbc.gov.cn/kunming/133736/133760/133767/index.html"),
    ("西藏自治区", "https://lasa.pbc.gov.cn/lasa/120480/120504/120511/index.html"),
    ("陕西省", "https://xian.pbc.gov.cn/xian/129428/129449/129458/index.html"),
    ("甘肃省", "https://lanzhou.pbc.gov.cn/lanzhou/117067/117091/117057/index.html"),
    ("青海省", "https://xining.pbc.gov.cn/xining/118239/118263/118270/index.html"),
    ("宁夏回族自治区", "https://yinchuan.pbc.gov.cn/yinchuan/119983/120001/120008/index.html"),
    ("新疆维吾尔自治区", "https://wulumuqi.pbc.gov.cn/wulumuqi/121755/121777/121784/index.html"),
];

/// Which page template a branch site uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Portlet containers with `ul.txtlist` entries.
    Standard,
    /// Older template: a `td#content_right` column with table rows.
    Special,
}

impl Dialect {
    pub fn for_province(province: &str) -> Self {
        if SPECIAL_PROVINCES.contains(&province) {
            Dialect::Special
        } else {
            Dialect::Standard
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dialect::Standard => write!(f, "standard"),
            Dialect::Special => write!(f, "special"),
        }
    }
}

/// A monitored jurisdiction and the first page of its penalty listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteDescriptor {
    pub province: String,
    pub base_url: String,
    pub dialect: Dialect,
}

impl SiteDescriptor {
    pub fn new(province: impl Into<String>, base_url: impl Into<String>) -> Self {
        let province = province.into();
        let dialect = Dialect::for_province(&province);
        Self {
            province,
            base_url: base_url.into(),
            dialect,
        }
    }

    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }
}

impl std::fmt::Display for SiteDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.province, self.base_url)
    }
}

pub fn builtin_sites() -> Vec<SiteDescriptor> {
    BUILTIN_SITES
        .iter()
        .map(|(province, url)| SiteDescriptor::new(*province, *url))
        .collect()
}

/// Keep the sites named in `provinces`, or all of them when `None`.
pub fn select_sites(sites: &[SiteDescriptor], provinces: Option<&[String]>) -> Vec<SiteDescriptor> {
    match provinces {
        None => sites.to_vec(),
        Some(wanted) => sites
            .iter()
            .filter(|s| wanted.iter().any(|p| p == &s.province))
            .cloned()
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect_resolved_at_construction() {
        assert_eq!(SiteDescriptor::new("上海市", "https://x/index.html").dialect, Dialect::Special);
        assert_eq!(SiteDescriptor::new("海南省", "https://x/index.html").dialect, Dialect::Standard);
    }

    #[test]
    fn test_builtin_sites_cover_special_provinces() {
        let sites = builtin_sites();
        assert_eq!(sites.len(), 36);
        let special = sites.iter().filter(|s| s.dialect == Dialect::Special).count();
        assert_eq!(special, SPECIAL_PROVINCES.len());
    }

    #[test]
    fn test_select_sites() {
        let sites = builtin_sites();
        assert_eq!(select_sites(&sites, None).len(), sites.len());

        let wanted = vec!["重庆市".to_string(), "不存在".to_string()];
        let picked = select_sites(&sites, Some(&wanted));
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].province, "重庆市");
    }
}
